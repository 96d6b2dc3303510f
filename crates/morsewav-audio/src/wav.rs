//! WAV file output through `hound`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use morsewav_cw::sink::{check_frame_len, StreamParams};
use morsewav_cw::{PcmSink, SinkError};

type Writer = hound::WavWriter<BufWriter<File>>;

/// Writes a 16-bit mono WAV file.
///
/// The file is created on the first write, once the stream parameters are known,
/// and finalised on close. Closing a sink that was never written still produces a
/// valid, empty file.
pub struct WavFileSink {
    path: PathBuf,
    params: StreamParams,
    writer: Option<Writer>,
    closed: bool,
}

impl WavFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            params: StreamParams::default(),
            writer: None,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_open(&self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut Writer, SinkError> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let spec = hound::WavSpec {
                    channels: 1,
                    sample_rate: self.params.ready()?,
                    bits_per_sample: 16,
                    sample_format: hound::SampleFormat::Int,
                };
                log::debug!("creating {} at {} Hz", self.path.display(), spec.sample_rate);
                hound::WavWriter::create(&self.path, spec).map_err(wav_error)?
            }
        };
        Ok(self.writer.insert(writer))
    }
}

impl PcmSink for WavFileSink {
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
        check_frame_len(bytes)?;
        let writer = self.writer()?;
        for pair in bytes.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(wav_error)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.check_open()?;
        self.closed = true;
        if self.writer.is_none() && self.params.ready().is_err() {
            // Never configured, so there is no stream to finalise.
            return Ok(());
        }
        self.writer()?;
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(wav_error)?;
        }
        log::debug!("finalised {}", self.path.display());
        Ok(())
    }
}

fn wav_error(err: hound::Error) -> SinkError {
    match err {
        hound::Error::IoError(err) => SinkError::Io(err),
        other => SinkError::Wav(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsewav_cw::{render, SessionConfig, Timing};

    #[test]
    fn writes_readable_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sos.wav");
        let config = SessionConfig::default();
        let summary = render(config, ["SOS"], WavFileSink::new(&path)).expect("render");

        let reader = hound::WavReader::open(&path).expect("open wav");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(u64::from(reader.duration()), summary.samples);

        let timing = Timing::new(config.sample_rate, config.wpm, config.letter_spacing_percent)
            .expect("timing");
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<_, _>>()
            .expect("samples");
        let lead_in = timing.lead_in_samples();
        assert!(samples[..lead_in].iter().all(|&s| s == 0));
        let peak = samples.iter().map(|s| s.unsigned_abs()).max();
        assert_eq!(peak, Some(30_000));
    }

    #[test]
    fn empty_session_still_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.wav");
        render(SessionConfig::default(), [""], WavFileSink::new(&path)).expect("render");
        let reader = hound::WavReader::open(&path).expect("open wav");
        assert_eq!(reader.duration(), 11_025);
    }

    #[test]
    fn closed_without_writes_is_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("silent.wav");
        let mut sink = WavFileSink::new(&path);
        sink.set_sample_rate(8_000).expect("rate");
        sink.set_channel_count(1).expect("channels");
        sink.set_sample_width_bytes(2).expect("width");
        sink.close().expect("close");
        let reader = hound::WavReader::open(&path).expect("open wav");
        assert_eq!(reader.duration(), 0);
        assert!(matches!(sink.close(), Err(SinkError::Closed)));
    }

    #[test]
    fn write_before_configure_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = WavFileSink::new(dir.path().join("never.wav"));
        assert!(matches!(
            sink.write_raw_frames(&[0, 0]),
            Err(SinkError::NotConfigured)
        ));
        assert!(!sink.path().exists());
    }
}
