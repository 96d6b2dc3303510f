//! Concrete PCM sinks: WAV files and live output devices.

pub mod device;
pub mod wav;

pub use device::DeviceSink;
pub use wav::WavFileSink;
