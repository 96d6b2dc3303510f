use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufWriter};
use std::path::PathBuf;

use morsewav_audio::device::output_device_names;
use morsewav_audio::{DeviceSink, WavFileSink};
use morsewav_cw::config::{
    DEFAULT_AMPLITUDE, DEFAULT_FREQUENCY_HZ, DEFAULT_LETTER_SPACING_PERCENT, DEFAULT_SAMPLE_RATE,
    DEFAULT_WPM,
};
use morsewav_cw::{render, PcmSink, RawSink, Session, SessionConfig, SessionSummary};

#[derive(Parser, Debug)]
#[command(
    name = "morsewav",
    about = "Render text as Morse code audio",
    after_help = "Words are taken from the command line, or read line by line from stdin."
)]
struct Args {
    /// WAV file to write. Plays on the output device when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tone frequency in Hz.
    #[arg(short, long, default_value_t = DEFAULT_FREQUENCY_HZ)]
    frequency: f64,

    /// Sample rate in Hz.
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Speed in words per minute.
    #[arg(short, long, default_value_t = DEFAULT_WPM)]
    wpm: u32,

    /// Peak amplitude, 0 (silence) to 32767 (loudest).
    #[arg(short, long, default_value_t = DEFAULT_AMPLITUDE)]
    amplitude: u32,

    /// Letter and word spacing in percent; raise above 100 for Farnsworth timing.
    #[arg(short, long, default_value_t = DEFAULT_LETTER_SPACING_PERCENT)]
    letter_spacing: u32,

    /// Log the session parameters and the dots and dashes of each line.
    #[arg(short, long)]
    verbose: bool,

    /// Regex selecting the output device by name.
    #[arg(long, conflicts_with = "output")]
    device: Option<String>,

    /// Write headerless 16-bit little-endian PCM instead of WAV.
    #[arg(long, requires = "output")]
    raw: bool,

    /// Print the names of the available output devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Text to send.
    words: Vec<String>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sample_rate: self.sample_rate,
            frequency_hz: self.frequency,
            amplitude: self.amplitude,
            wpm: self.wpm,
            letter_spacing_percent: self.letter_spacing,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_devices {
        for name in output_device_names()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = args.session_config();
    let summary = match &args.output {
        Some(path) if args.raw => {
            log::info!("writing raw PCM to {}", path.display());
            let file = BufWriter::new(File::create(path)?);
            run(config, &args.words, RawSink::new(file))?
        }
        Some(path) => {
            log::info!("writing WAV to {}", path.display());
            run(config, &args.words, WavFileSink::new(path))?
        }
        None => run(config, &args.words, DeviceSink::new(args.device.as_deref()))?,
    };

    log::info!("rendered {:.2} s of audio", summary.duration.as_secs_f64());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run<S: PcmSink>(
    config: SessionConfig,
    words: &[String],
    sink: S,
) -> Result<SessionSummary, Box<dyn std::error::Error>> {
    if !words.is_empty() {
        return Ok(render(config, [words.join(" ")], sink)?);
    }

    let mut session = Session::start(config, sink)?;
    play_lines(&mut session, std::io::stdin().lock())?;
    Ok(session.finish()?)
}

/// Play every line of `reader`. Bytes that are not UTF-8 decode to U+FFFD, which
/// has no Morse pattern and is dropped like any other unmapped character.
fn play_lines<S: PcmSink, R: BufRead>(
    session: &mut Session<S>,
    mut reader: R,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines);
        }
        let text = String::from_utf8_lossy(&buf);
        session.play_line(text.trim_end_matches(&['\r', '\n'][..]))?;
        lines += 1;
    }
}
