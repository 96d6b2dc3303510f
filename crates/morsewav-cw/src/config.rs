use crate::error::MorseError;

pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_FREQUENCY_HZ: f64 = 850.0;
pub const DEFAULT_AMPLITUDE: u32 = 30_000;
pub const DEFAULT_WPM: u32 = 25;
pub const DEFAULT_LETTER_SPACING_PERCENT: u32 = 100;

/// Largest peak amplitude a 16-bit sample can hold.
pub const MAX_AMPLITUDE: u32 = i16::MAX as u32;

/// Parameters of one render session, fixed before the first sample is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub sample_rate: u32,
    pub frequency_hz: f64,
    /// Peak amplitude, 0 (silence) to 32767.
    pub amplitude: u32,
    pub wpm: u32,
    /// 100 is standard spacing; larger values stretch letter and word gaps
    /// (Farnsworth style) without changing dot and dash lengths.
    pub letter_spacing_percent: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            wpm: DEFAULT_WPM,
            letter_spacing_percent: DEFAULT_LETTER_SPACING_PERCENT,
        }
    }
}

impl SessionConfig {
    /// Check every parameter the renderer relies on.
    pub fn validate(&self) -> Result<(), MorseError> {
        if self.wpm == 0 {
            return Err(invalid("words per minute must be at least 1"));
        }
        if self.sample_rate == 0 {
            return Err(invalid("sample rate must be at least 1 Hz"));
        }
        if self.amplitude > MAX_AMPLITUDE {
            return Err(invalid(format!(
                "amplitude {} exceeds {}",
                self.amplitude, MAX_AMPLITUDE
            )));
        }
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(invalid(format!(
                "tone frequency {} Hz must be positive",
                self.frequency_hz
            )));
        }

        let nyquist = self.sample_rate as f64 / 2.0;
        if self.frequency_hz >= nyquist {
            log::warn!(
                "tone frequency {} Hz is at or above the Nyquist frequency {} Hz and will alias",
                self.frequency_hz,
                nyquist
            );
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> MorseError {
    MorseError::InvalidConfiguration(message.into())
}
