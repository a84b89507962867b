/// Frequency of the reference C (slot offset 0, octave 0) in Hz.
pub const REFERENCE_FREQ: f32 = 261.6;

/// Moving up a semitone multiplies the frequency by this factor.
pub const SEMITONE: f32 = 1.05946;

/// Computes the unmodified frequency of a note, given as a semitone offset from the
/// reference C, in the given octave.
pub fn base_frequency(semitones: i32, octave: i32) -> f32 {
    REFERENCE_FREQ * 2f32.powi(octave) * SEMITONE.powi(semitones)
}

/// Wraps a phase into `[0, 1)`, including for negative values.
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(1.0);
    // `rem_euclid` can round up to exactly 1.0 for tiny negative inputs, and a
    // non-finite phase restarts the cycle
    if wrapped < 1.0 {
        wrapped
    } else {
        0.0
    }
}

/// True modulo for floats, always in `[0, m)` for positive `m`.
pub fn fmod(x: f32, m: f32) -> f32 {
    x.rem_euclid(m)
}
