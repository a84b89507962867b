use clap::Parser;
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use tracing::info;
use vibro_engine::{output::AudioOutput, Config, ControlInput, Engine, PlayMode, Renderer, Result};

/// Plays a scripted performance on the vibro synth engine.
#[derive(Parser, Debug)]
#[command(name = "vibro")]
#[command(version)]
struct Args {
    /// Configuration file with engine settings and instruments
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render offline to this WAV file instead of playing live
    #[arg(long)]
    render: Option<PathBuf>,

    /// Length of the performance in seconds
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,

    /// Play chords instead of a solo melody
    #[arg(long)]
    chord: bool,

    /// Record the live performance to this WAV file
    #[arg(long)]
    record: Option<PathBuf>,
}

const MELODY: [usize; 8] = [1, 5, 8, 13, 12, 8, 5, 3];
const CHORDS: [[usize; 3]; 4] = [[1, 5, 8], [6, 10, 13], [8, 12, 15], [1, 5, 8]];

/// The performer's input on a given tick.
fn performance(tick: u32, control_rate: u32, chord: bool) -> ControlInput {
    let beat = (control_rate / 2).max(8);
    let step = (tick / beat) as usize;
    let pos = tick % beat;

    if chord {
        let bar = step / 2;
        let mut input = if step % 2 == 1 && pos + 4 >= beat {
            ControlInput::default()
        } else {
            ControlInput::with_keys(&CHORDS[bar % CHORDS.len()])
        };
        input.vibrato_key = step % 2 == 1 && (pos / 6) % 2 == 0;
        input.scroll = if bar % 4 == 2 && pos < 3 { 1.0 } else { 0.0 };
        return input;
    }

    let note = MELODY[step % MELODY.len()];
    let next = MELODY[(step + 1) % MELODY.len()];
    let mut input = if step % MELODY.len() == MELODY.len() - 1 && pos + 6 >= beat {
        // Breathe at the end of the phrase
        ControlInput::default()
    } else if pos + 3 >= beat {
        // Overlap into the next note for legato
        ControlInput::with_keys(&[note, next])
    } else {
        ControlInput::with_keys(&[note])
    };

    // Slide into every other note
    if step % 2 == 0 && pos + 6 >= beat {
        input.pointer_dy = if next > note { -4.0 } else { 4.0 };
    }
    // Tap vibrato on the second half of each note
    input.vibrato_key = pos >= beat / 2 && (pos / 5) % 2 == 0;
    input.dive_key = step % 16 == 15 && pos == 0;
    input
}

fn render_offline(mut engine: Engine, mut renderer: Renderer, path: PathBuf, ticks: u32, chord: bool) -> Result<()> {
    let sample_rate = engine.config().sample_rate;
    let control_rate = engine.config().control_rate;
    let mut buffer = vec![0i16; (sample_rate / control_rate) as usize + 1];
    let mut rendered = 0u64;

    engine.start_recording(&path)?;
    for tick in 0..ticks {
        engine.tick(&performance(tick, control_rate, chord));

        // Render exactly the samples that fall within this tick
        let end = (tick as u64 + 1) * sample_rate as u64 / control_rate as u64;
        let len = (end - rendered) as usize;
        renderer.render(&mut buffer[..len]);
        rendered = end;
    }
    if let Some(path) = engine.stop_recording()? {
        info!("Rendered {} samples to {:?}", rendered, path);
    }
    Ok(())
}

fn play_live(mut config: Config, record: Option<PathBuf>, ticks: u32, chord: bool) -> Result<()> {
    let output = AudioOutput::open(config.engine.sample_rate)?;
    config.engine.sample_rate = output.sample_rate();
    let (mut engine, renderer) = Engine::from_config(config);
    let _stream = output.start(renderer)?;

    if let Some(path) = record {
        engine.start_recording(path)?;
    }

    let control_rate = engine.config().control_rate;
    let period = Duration::from_secs_f64(1.0 / control_rate as f64);
    let start = Instant::now();
    for tick in 0..ticks {
        engine.tick(&performance(tick, control_rate, chord));
        if tick == ticks / 2 {
            engine.select_next_instrument();
        }
        let deadline = start + period * (tick + 1);
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    engine.kill_all();
    thread::sleep(Duration::from_millis(100));
    engine.stop_recording()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.chord {
        config.engine.play_mode = PlayMode::Chord;
    }
    let chord = config.engine.play_mode == PlayMode::Chord;
    let ticks = (args.seconds.max(0.0) * config.engine.control_rate.max(1) as f32) as u32;

    match args.render {
        Some(path) => {
            let (engine, renderer) = Engine::from_config(config);
            render_offline(engine, renderer, path, ticks, chord)
        }
        None => play_live(config, args.record, ticks, chord),
    }
}
