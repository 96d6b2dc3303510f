//! Error types shared by the synthesis engine and the sink adapters.

use thiserror::Error;

/// Errors raised while configuring or running a render session.
#[derive(Debug, Error)]
pub enum MorseError {
    /// A session parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The sink rejected a write or failed to close.
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),
}

/// Errors reported by a [`PcmSink`](crate::PcmSink) implementation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Frames were written before the stream parameters were set.
    #[error("sink stream parameters not set before first write")]
    NotConfigured,

    #[error("sink already closed")]
    Closed,

    #[error("unsupported stream format: {0}")]
    UnsupportedFormat(String),

    /// 16-bit frames always come in pairs of bytes.
    #[error("frame buffer of {0} bytes is not a whole number of samples")]
    OddFrameLength(usize),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("wav writer error: {0}")]
    Wav(String),
}
