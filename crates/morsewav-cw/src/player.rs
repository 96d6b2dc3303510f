use crate::config::SessionConfig;
use crate::encode::{MorseLine, MorseSymbol};
use crate::error::{MorseError, SinkError};
use crate::sink::PcmSink;
use crate::timing::Timing;
use crate::tone::{ToneBuffer, ToneCache, ToneSpec};

/// Largest run of silence handed to the sink in one write.
const SILENCE_CHUNK_SAMPLES: usize = 4096;

/// Plays encoded lines into a sink using pre-rendered dot and dash tones.
pub struct SymbolPlayer {
    timing: Timing,
    dot_frames: Vec<u8>,
    dash_frames: Vec<u8>,
    silence: Vec<u8>,
    cursor: u64,
}

impl SymbolPlayer {
    /// Create a player from already rendered tones.
    pub fn new(timing: Timing, dot_tone: &ToneBuffer, dash_tone: &ToneBuffer) -> Self {
        Self {
            timing,
            dot_frames: dot_tone.to_le_bytes(),
            dash_frames: dash_tone.to_le_bytes(),
            silence: ToneBuffer::silence(SILENCE_CHUNK_SAMPLES).to_le_bytes(),
            cursor: 0,
        }
    }

    /// Validate `config`, derive its timing and render both tones through `tones`.
    pub fn from_config(config: &SessionConfig, tones: &mut ToneCache) -> Result<Self, MorseError> {
        config.validate()?;
        let timing = Timing::new(config.sample_rate, config.wpm, config.letter_spacing_percent)?;

        let tone = |duration_samples| ToneSpec {
            frequency_hz: config.frequency_hz,
            amplitude: config.amplitude,
            sample_rate: config.sample_rate,
            duration_samples,
            ramp_samples: timing.ramp_samples(),
        };
        let dot = tones.get_or_render(&tone(timing.dot_samples()));
        let dash = tones.get_or_render(&tone(timing.dash_samples()));

        Ok(Self::new(timing, &dot, &dash))
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Samples written since the player was created.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Write the half-second lead-in that precedes the first symbol.
    pub fn lead_in<S: PcmSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SinkError> {
        self.write_silence(sink, self.timing.lead_in_samples())
    }

    /// Write every symbol of `line` in order.
    pub fn play<S: PcmSink + ?Sized>(
        &mut self,
        line: &MorseLine,
        sink: &mut S,
    ) -> Result<(), SinkError> {
        for symbol in line.iter() {
            match symbol {
                MorseSymbol::Dot => {
                    sink.write_raw_frames(&self.dot_frames)?;
                    self.cursor += self.timing.dot_samples() as u64;
                    self.write_silence(sink, self.timing.element_gap_samples())?;
                }
                MorseSymbol::Dash => {
                    sink.write_raw_frames(&self.dash_frames)?;
                    self.cursor += self.timing.dash_samples() as u64;
                    self.write_silence(sink, self.timing.element_gap_samples())?;
                }
                MorseSymbol::LetterGap => {
                    self.write_silence(sink, self.timing.letter_gap_samples())?;
                }
                MorseSymbol::WordGap => {
                    self.write_silence(sink, self.timing.word_gap_samples())?;
                }
            }
        }
        Ok(())
    }

    fn write_silence<S: PcmSink + ?Sized>(
        &mut self,
        sink: &mut S,
        samples: usize,
    ) -> Result<(), SinkError> {
        let mut remaining = samples;
        while remaining > 0 {
            let take = remaining.min(SILENCE_CHUNK_SAMPLES);
            sink.write_raw_frames(&self.silence[..take * 2])?;
            self.cursor += take as u64;
            remaining -= take;
        }
        Ok(())
    }
}
