use std::io::Write;

use crate::error::SinkError;

/// Destination for rendered 16-bit mono PCM.
///
/// Stream parameters are set once before the first write. `close` finalises the
/// stream: a file sink writes its trailer, a device sink drains playback.
pub trait PcmSink {
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), SinkError>;
    fn set_channel_count(&mut self, channels: u8) -> Result<(), SinkError>;
    fn set_sample_width_bytes(&mut self, width: u8) -> Result<(), SinkError>;

    /// Append little-endian PCM bytes.
    fn write_raw_frames(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

impl<S: PcmSink + ?Sized> PcmSink for &mut S {
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), SinkError> {
        (**self).set_sample_rate(sample_rate)
    }

    fn set_channel_count(&mut self, channels: u8) -> Result<(), SinkError> {
        (**self).set_channel_count(channels)
    }

    fn set_sample_width_bytes(&mut self, width: u8) -> Result<(), SinkError> {
        (**self).set_sample_width_bytes(width)
    }

    fn write_raw_frames(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).write_raw_frames(bytes)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}

impl<S: PcmSink + ?Sized> PcmSink for Box<S> {
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), SinkError> {
        (**self).set_sample_rate(sample_rate)
    }

    fn set_channel_count(&mut self, channels: u8) -> Result<(), SinkError> {
        (**self).set_channel_count(channels)
    }

    fn set_sample_width_bytes(&mut self, width: u8) -> Result<(), SinkError> {
        (**self).set_sample_width_bytes(width)
    }

    fn write_raw_frames(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).write_raw_frames(bytes)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}

/// Mono 16-bit stream parameters as collected by a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
    pub sample_width_bytes: Option<u8>,
}

impl StreamParams {
    pub fn set_channel_count(&mut self, channels: u8) -> Result<(), SinkError> {
        if channels != 1 {
            return Err(SinkError::UnsupportedFormat(format!(
                "{} channels (only mono is supported)",
                channels
            )));
        }
        self.channels = Some(channels);
        Ok(())
    }

    pub fn set_sample_width_bytes(&mut self, width: u8) -> Result<(), SinkError> {
        if width != 2 {
            return Err(SinkError::UnsupportedFormat(format!(
                "{}-byte samples (only 16-bit is supported)",
                width
            )));
        }
        self.sample_width_bytes = Some(width);
        Ok(())
    }

    /// Sample rate, once every parameter has been set.
    pub fn ready(&self) -> Result<u32, SinkError> {
        match (self.sample_rate, self.channels, self.sample_width_bytes) {
            (Some(rate), Some(_), Some(_)) => Ok(rate),
            _ => Err(SinkError::NotConfigured),
        }
    }
}

/// Check a raw frame buffer holds whole 16-bit samples.
pub fn check_frame_len(bytes: &[u8]) -> Result<(), SinkError> {
    if bytes.len() % 2 != 0 {
        return Err(SinkError::OddFrameLength(bytes.len()));
    }
    Ok(())
}

/// Headerless PCM written straight to any [`Write`].
#[derive(Debug)]
pub struct RawSink<W: Write> {
    writer: W,
    params: StreamParams,
    closed: bool,
}

impl<W: Write> RawSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            params: StreamParams::default(),
            closed: false,
        }
    }

    pub fn params(&self) -> StreamParams {
        self.params
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn check_open(&self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        Ok(())
    }
}

impl<W: Write> PcmSink for RawSink<W> {
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), SinkError> {
        self.check_open()?;
        self.params.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn set_channel_count(&mut self, channels: u8) -> Result<(), SinkError> {
        self.check_open()?;
        self.params.set_channel_count(channels)
    }

    fn set_sample_width_bytes(&mut self, width: u8) -> Result<(), SinkError> {
        self.check_open()?;
        self.params.set_sample_width_bytes(width)
    }

    fn write_raw_frames(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.check_open()?;
        self.params.ready()?;
        check_frame_len(bytes)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.check_open()?;
        self.closed = true;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RawSink<Vec<u8>> {
        let mut sink = RawSink::new(Vec::new());
        sink.set_sample_rate(8_000).expect("rate");
        sink.set_channel_count(1).expect("channels");
        sink.set_sample_width_bytes(2).expect("width");
        sink
    }

    #[test]
    fn passes_bytes_through() {
        let mut sink = configured();
        sink.write_raw_frames(&[1, 2, 3, 4]).expect("write");
        sink.write_raw_frames(&[5, 6]).expect("write");
        sink.close().expect("close");
        assert!(sink.is_closed());
        assert_eq!(sink.params().sample_rate, Some(8_000));
        assert_eq!(sink.into_inner(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn write_before_configure_fails() {
        let mut sink = RawSink::new(Vec::new());
        assert!(matches!(
            sink.write_raw_frames(&[0, 0]),
            Err(SinkError::NotConfigured)
        ));
    }

    #[test]
    fn rejects_stereo_and_wide_samples() {
        let mut sink = RawSink::new(Vec::new());
        assert!(matches!(
            sink.set_channel_count(2),
            Err(SinkError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            sink.set_sample_width_bytes(3),
            Err(SinkError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_odd_frames_and_closed_writes() {
        let mut sink = configured();
        assert!(matches!(
            sink.write_raw_frames(&[0, 0, 0]),
            Err(SinkError::OddFrameLength(3))
        ));
        sink.close().expect("close");
        assert!(matches!(sink.write_raw_frames(&[0, 0]), Err(SinkError::Closed)));
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }
}
