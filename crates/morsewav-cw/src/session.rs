//! Render sessions: one sink, one configuration, any number of lines.

use std::time::Duration;

use crate::config::SessionConfig;
use crate::encode::encode;
use crate::error::MorseError;
use crate::player::SymbolPlayer;
use crate::sink::PcmSink;
use crate::tone::ToneCache;

/// What a finished session produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub lines: usize,
    pub samples: u64,
    pub duration: Duration,
}

/// Owns a sink for the length of one render.
///
/// The sink is configured and the lead-in written when the session starts. It is
/// closed by [`Session::finish`], or on drop if the session ends early.
pub struct Session<S: PcmSink> {
    sink: S,
    player: SymbolPlayer,
    tones: ToneCache,
    sample_rate: u32,
    lines: usize,
    closed: bool,
}

impl<S: PcmSink> Session<S> {
    pub fn start(config: SessionConfig, mut sink: S) -> Result<Self, MorseError> {
        let mut tones = ToneCache::new();
        let player = match SymbolPlayer::from_config(&config, &mut tones) {
            Ok(player) => player,
            Err(err) => {
                if let Err(close_err) = sink.close() {
                    log::warn!("failed to close sink after configuration error: {}", close_err);
                }
                return Err(err);
            }
        };

        let mut session = Self {
            sink,
            player,
            tones,
            sample_rate: config.sample_rate,
            lines: 0,
            closed: false,
        };
        session.open()?;

        log::info!(
            "session started: {} Hz tone, {} wpm, {}% spacing, {} Hz sample rate",
            config.frequency_hz,
            config.wpm,
            config.letter_spacing_percent,
            config.sample_rate
        );
        Ok(session)
    }

    fn open(&mut self) -> Result<(), MorseError> {
        self.sink.set_sample_rate(self.sample_rate)?;
        self.sink.set_channel_count(1)?;
        self.sink.set_sample_width_bytes(2)?;
        self.player.lead_in(&mut self.sink)?;
        Ok(())
    }

    /// Encode one line of text and play it straight after the previous one.
    pub fn play_line(&mut self, text: &str) -> Result<(), MorseError> {
        let line = encode(text);
        log::info!("{}", line.display());
        self.player.play(&line, &mut self.sink)?;
        self.lines += 1;
        Ok(())
    }

    /// Samples written so far, lead-in included.
    pub fn samples_written(&self) -> u64 {
        self.player.cursor()
    }

    /// Number of distinct tones rendered for this session.
    pub fn rendered_tones(&self) -> usize {
        self.tones.len()
    }

    /// Close the sink and report what was rendered.
    pub fn finish(mut self) -> Result<SessionSummary, MorseError> {
        self.closed = true;
        self.sink.close()?;

        let samples = self.player.cursor();
        let summary = SessionSummary {
            lines: self.lines,
            samples,
            duration: Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate)),
        };
        log::info!(
            "session finished: {} lines, {} samples ({:.2} s)",
            summary.lines,
            summary.samples,
            summary.duration.as_secs_f64()
        );
        Ok(summary)
    }
}

impl<S: PcmSink> Drop for Session<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.sink.close() {
            log::warn!("failed to close sink of abandoned session: {}", err);
        }
    }
}

/// Play every line into `sink` and close it, whether or not playback succeeds.
pub fn render<I, T, S>(
    config: SessionConfig,
    lines: I,
    sink: S,
) -> Result<SessionSummary, MorseError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
    S: PcmSink,
{
    let mut session = Session::start(config, sink)?;
    for line in lines {
        session.play_line(line.as_ref())?;
    }
    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::MorseSymbol;
    use crate::error::SinkError;
    use crate::sink::RawSink;
    use crate::timing::Timing;

    /// Accepts a fixed number of bytes, then fails every write.
    struct FailingSink {
        budget: usize,
        written: usize,
        closes: usize,
        fail_close: bool,
    }

    impl FailingSink {
        fn new(budget: usize) -> Self {
            Self {
                budget,
                written: 0,
                closes: 0,
                fail_close: false,
            }
        }
    }

    impl PcmSink for FailingSink {
        fn set_sample_rate(&mut self, _: u32) -> Result<(), SinkError> {
            Ok(())
        }

        fn set_channel_count(&mut self, _: u8) -> Result<(), SinkError> {
            Ok(())
        }

        fn set_sample_width_bytes(&mut self, _: u8) -> Result<(), SinkError> {
            Ok(())
        }

        fn write_raw_frames(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
            if self.written + bytes.len() > self.budget {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "disk full",
                )));
            }
            self.written += bytes.len();
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            self.closes += 1;
            if self.fail_close {
                return Err(SinkError::Device("close failed".to_string()));
            }
            Ok(())
        }
    }

    fn default_timing() -> Timing {
        let config = SessionConfig::default();
        Timing::new(config.sample_rate, config.wpm, config.letter_spacing_percent).expect("timing")
    }

    #[test]
    fn sos_end_to_end() {
        let line = encode("SOS");
        assert_eq!(
            line.symbols(),
            &[
                MorseSymbol::Dot,
                MorseSymbol::Dot,
                MorseSymbol::Dot,
                MorseSymbol::LetterGap,
                MorseSymbol::Dash,
                MorseSymbol::Dash,
                MorseSymbol::Dash,
                MorseSymbol::LetterGap,
                MorseSymbol::Dot,
                MorseSymbol::Dot,
                MorseSymbol::Dot,
            ]
        );

        let mut sink = RawSink::new(Vec::new());
        let summary = render(SessionConfig::default(), ["SOS"], &mut sink).expect("render");

        let timing = default_timing();
        let dot = timing.dot_samples();
        let dash = timing.dash_samples();
        let expected =
            timing.lead_in_samples() + 6 * (dot + dot) + 3 * (dash + dot) + 2 * (dash + dot);
        assert_eq!(expected, 11_025 + 12_696 + 12_696 + 8_464);
        assert_eq!(summary.samples, expected as u64);
        assert_eq!(summary.lines, 1);
        assert!(sink.is_closed());
        assert_eq!(sink.get_ref().len(), 2 * expected);
    }

    #[test]
    fn empty_text_is_only_lead_in() {
        for text in ["", "#%^~"] {
            let mut sink = RawSink::new(Vec::new());
            let summary = render(SessionConfig::default(), [text], &mut sink).expect("render");
            assert_eq!(summary.samples, 11_025);
            assert_eq!(summary.duration, Duration::from_millis(500));
            assert!(sink.is_closed());
            assert_eq!(sink.get_ref().len(), 22_050);
            assert!(sink.get_ref().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn lines_play_contiguously() {
        let mut sink = RawSink::new(Vec::new());
        let summary = render(SessionConfig::default(), ["E", "T"], &mut sink).expect("render");
        let timing = default_timing();
        let expected =
            timing.lead_in_samples() + 2 * timing.dot_samples() + 4 * timing.dot_samples();
        assert_eq!(summary.lines, 2);
        assert_eq!(summary.samples, expected as u64);
    }

    #[test]
    fn session_renders_two_tones() {
        let mut sink = RawSink::new(Vec::new());
        let mut session = Session::start(SessionConfig::default(), &mut sink).expect("start");
        session.play_line("the quick brown fox 0123456789").expect("play");
        assert_eq!(session.rendered_tones(), 2);
        session.finish().expect("finish");
    }

    #[test]
    fn invalid_config_closes_sink() {
        let mut sink = FailingSink::new(usize::MAX);
        let config = SessionConfig {
            wpm: 0,
            ..SessionConfig::default()
        };
        let result = render(config, ["SOS"], &mut sink);
        assert!(matches!(result, Err(MorseError::InvalidConfiguration(_))));
        assert_eq!(sink.closes, 1);
        assert_eq!(sink.written, 0);
    }

    #[test]
    fn write_failure_aborts_and_closes() {
        // Lead-in fits, the first dot does not.
        let mut sink = FailingSink::new(22_050);
        let result = render(SessionConfig::default(), ["SOS"], &mut sink);
        assert!(matches!(result, Err(MorseError::Sink(SinkError::Io(_)))));
        assert_eq!(sink.written, 22_050);
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn write_error_wins_over_close_error() {
        let mut sink = FailingSink::new(22_050);
        sink.fail_close = true;
        let result = render(SessionConfig::default(), ["SOS"], &mut sink);
        assert!(matches!(result, Err(MorseError::Sink(SinkError::Io(_)))));
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn close_error_is_reported_after_clean_playback() {
        let mut sink = FailingSink::new(usize::MAX);
        sink.fail_close = true;
        let result = render(SessionConfig::default(), ["SOS"], &mut sink);
        assert!(matches!(result, Err(MorseError::Sink(SinkError::Device(_)))));
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn dropped_session_closes_sink() {
        let mut sink = RawSink::new(Vec::new());
        {
            let mut session = Session::start(SessionConfig::default(), &mut sink).expect("start");
            session.play_line("E").expect("play");
        }
        assert!(sink.is_closed());
    }
}
