use crate::encode::{MorseLine, MorseSymbol};
use crate::error::MorseError;

/// Fraction of a dot spent ramping the tone up, and again ramping it down.
const RAMP_FRACTION: f64 = 0.075;

/// Sample counts for every Morse element at a given speed and sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    sample_rate: u32,
    wpm: u32,
    letter_spacing_percent: u32,
    dot_samples: usize,
    ramp_samples: usize,
}

impl Timing {
    /// Derive element lengths from words per minute.
    ///
    /// Uses the PARIS standard: 50 elements per word, so one dot lasts
    /// `1200 / wpm` milliseconds. The sample count is floored once, on the exact
    /// product, so 7 wpm at 22050 Hz gives 3780 samples rather than the 3770 a
    /// whole-millisecond dot would.
    pub fn new(
        sample_rate: u32,
        wpm: u32,
        letter_spacing_percent: u32,
    ) -> Result<Self, MorseError> {
        if wpm == 0 {
            return Err(MorseError::InvalidConfiguration(
                "words per minute must be at least 1".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(MorseError::InvalidConfiguration(
                "sample rate must be at least 1 Hz".to_string(),
            ));
        }

        // floor(1200 ms / wpm / 1000 * rate), kept in integers.
        let dot_samples = (1200 * u64::from(sample_rate) / (1000 * u64::from(wpm))) as usize;
        let ramp_samples = (dot_samples as f64 * RAMP_FRACTION).round() as usize;

        let timing = Self {
            sample_rate,
            wpm,
            letter_spacing_percent,
            dot_samples,
            ramp_samples,
        };
        log::debug!(
            "timing: {} wpm at {} Hz -> dot {} samples, dash {} samples, ramp {} samples",
            wpm,
            sample_rate,
            timing.dot_samples(),
            timing.dash_samples(),
            timing.ramp_samples()
        );
        Ok(timing)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn letter_spacing_percent(&self) -> u32 {
        self.letter_spacing_percent
    }

    pub fn dot_samples(&self) -> usize {
        self.dot_samples
    }

    pub fn dash_samples(&self) -> usize {
        3 * self.dot_samples
    }

    pub fn ramp_samples(&self) -> usize {
        self.ramp_samples
    }

    /// Silence after every dot or dash. Never scaled by letter spacing.
    pub fn element_gap_samples(&self) -> usize {
        self.dot_samples
    }

    /// Silence between two characters of a word.
    pub fn letter_gap_samples(&self) -> usize {
        self.scaled(self.dash_samples() + self.dot_samples)
    }

    /// Silence for a space: dot-dash-dash.
    pub fn word_gap_samples(&self) -> usize {
        self.scaled(self.dot_samples + 2 * self.dash_samples())
    }

    /// Half a second of silence before the first symbol of a session.
    pub fn lead_in_samples(&self) -> usize {
        (self.sample_rate / 2) as usize
    }

    /// Total samples one symbol renders to, trailing gap included.
    pub fn symbol_samples(&self, symbol: MorseSymbol) -> usize {
        match symbol {
            MorseSymbol::Dot => self.dot_samples + self.element_gap_samples(),
            MorseSymbol::Dash => self.dash_samples() + self.element_gap_samples(),
            MorseSymbol::LetterGap => self.letter_gap_samples(),
            MorseSymbol::WordGap => self.word_gap_samples(),
        }
    }

    /// Total samples a line renders to.
    pub fn line_samples(&self, line: &MorseLine) -> usize {
        line.iter().map(|symbol| self.symbol_samples(symbol)).sum()
    }

    fn scaled(&self, samples: usize) -> usize {
        (samples as u64 * u64::from(self.letter_spacing_percent) / 100) as usize
    }
}
