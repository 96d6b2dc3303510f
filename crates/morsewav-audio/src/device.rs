use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use regex::Regex;
use ringbuf::{HeapProducer, HeapRb};
use std::time::{Duration, Instant};

use morsewav_cw::sink::{check_frame_len, StreamParams};
use morsewav_cw::{PcmSink, SinkError};

const RING_SECONDS: u32 = 2;
const PUSH_RETRY: Duration = Duration::from_millis(5);
const DRAIN_POLL: Duration = Duration::from_millis(10);
/// Slack on top of a full ring's play time before a blocked write gives up.
const STALL_MARGIN: Duration = Duration::from_secs(1);
/// Time left for the device's own buffer to play out after the ring drains.
const DRAIN_TAIL: Duration = Duration::from_millis(250);

/// Plays PCM on a live output device.
///
/// The stream is opened on the first write. Samples pass through a ring buffer to
/// the audio callback; writes block while the ring is full, and `close` waits for
/// the ring to drain before stopping the stream.
pub struct DeviceSink {
    device_regex: Option<String>,
    params: StreamParams,
    output: Option<Output>,
    scratch: Vec<f32>,
    closed: bool,
}

struct Output {
    stream: cpal::Stream,
    producer: HeapProducer<f32>,
    sample_rate: u32,
}

impl DeviceSink {
    /// Use the default output device, or the first whose name matches `device_regex`.
    pub fn new(device_regex: Option<&str>) -> Self {
        Self {
            device_regex: device_regex.map(str::to_string),
            params: StreamParams::default(),
            output: None,
            scratch: Vec::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        Ok(())
    }

    fn output(&mut self) -> Result<&mut Output, SinkError> {
        let output = match self.output.take() {
            Some(output) => output,
            None => start_output(self.params.ready()?, self.device_regex.as_deref())?,
        };
        Ok(self.output.insert(output))
    }
}

impl PcmSink for DeviceSink {
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

        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(bytes.chunks_exact(2).map(|pair| to_f32([pair[0], pair[1]])));

        let result = self.output().and_then(|output| {
            let timeout = output.stall_timeout();
            push_all(&mut output.producer, &scratch, timeout)
        });
        self.scratch = scratch;
        result
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.check_open()?;
        self.closed = true;
        let Some(output) = self.output.take() else {
            return Ok(());
        };

        let queued = output.producer.len() as f64 / f64::from(output.sample_rate);
        let deadline = Instant::now() + Duration::from_secs_f64(queued) + STALL_MARGIN;
        while !output.producer.is_empty() {
            if Instant::now() >= deadline {
                log::warn!("audio output stalled with {} samples queued", output.producer.len());
                break;
            }
            std::thread::sleep(DRAIN_POLL);
        }
        std::thread::sleep(DRAIN_TAIL);

        output
            .stream
            .pause()
            .map_err(|err| SinkError::Device(err.to_string()))?;
        Ok(())
    }
}

impl Output {
    /// How long a full ring takes to play out, plus slack.
    fn stall_timeout(&self) -> Duration {
        let capacity = self.producer.capacity() as f64 / f64::from(self.sample_rate);
        Duration::from_secs_f64(capacity) + STALL_MARGIN
    }
}

/// Push every sample, waiting while the ring is full.
///
/// Fails if the callback takes nothing for `timeout`, which happens once the
/// device stream has died.
fn push_all(
    producer: &mut HeapProducer<f32>,
    samples: &[f32],
    timeout: Duration,
) -> Result<(), SinkError> {
    let mut pending = samples;
    let mut deadline = Instant::now() + timeout;
    while !pending.is_empty() {
        let pushed = producer.push_slice(pending);
        pending = &pending[pushed..];
        if pending.is_empty() {
            break;
        }
        if pushed > 0 {
            deadline = Instant::now() + timeout;
        } else if Instant::now() >= deadline {
            return Err(SinkError::Device(format!(
                "audio output stalled with {} samples unwritten",
                pending.len()
            )));
        }
        std::thread::sleep(PUSH_RETRY);
    }
    Ok(())
}

fn to_f32(bytes: [u8; 2]) -> f32 {
    f32::from(i16::from_le_bytes(bytes)) / 32_768.0
}

fn start_output(sample_rate: u32, device_regex: Option<&str>) -> Result<Output, SinkError> {
    let host = cpal::default_host();
    let device = select_output_device(&host, device_regex)?;
    let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

    let config = device
        .supported_output_configs()
        .map_err(device_error)?
        .find(|cfg| {
            cfg.sample_format() == cpal::SampleFormat::F32
                && cfg.min_sample_rate().0 <= sample_rate
                && cfg.max_sample_rate().0 >= sample_rate
        })
        .map(|cfg| cfg.with_sample_rate(cpal::SampleRate(sample_rate)))
        .ok_or_else(|| {
            SinkError::UnsupportedFormat(format!(
                "output device {} has no f32 configuration at {} Hz",
                name, sample_rate
            ))
        })?;
    let config: cpal::StreamConfig = config.into();
    let channels = config.channels as usize;

    let ring = HeapRb::<f32>::new((sample_rate * RING_SECONDS) as usize);
    let (producer, mut consumer) = ring.split();

    let err_fn = |err| log::warn!("audio stream error: {}", err);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                // Mono source: every device channel gets the same sample.
                for frame in data.chunks_mut(channels) {
                    let sample = consumer.pop().unwrap_or(0.0);
                    for chan in frame.iter_mut() {
                        *chan = sample;
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(device_error)?;
    stream.play().map_err(device_error)?;

    log::info!("playing on {} ({} channels at {} Hz)", name, channels, sample_rate);
    Ok(Output {
        stream,
        producer,
        sample_rate,
    })
}

/// Names of all output devices on the default host.
pub fn output_device_names() -> Result<Vec<String>, SinkError> {
    let host = cpal::default_host();
    Ok(host
        .output_devices()
        .map_err(device_error)?
        .map(|dev| dev.name().unwrap_or_else(|_| "<unknown>".to_string()))
        .collect())
}

fn select_output_device(
    host: &cpal::Host,
    device_regex: Option<&str>,
) -> Result<cpal::Device, SinkError> {
    if let Some(pattern) = device_regex {
        let re = Regex::new(pattern)
            .map_err(|err| SinkError::Device(format!("invalid device pattern: {}", err)))?;
        for dev in host.output_devices().map_err(device_error)? {
            let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
            if re.is_match(&name) {
                return Ok(dev);
            }
        }
        return Err(SinkError::Device(format!(
            "no output device matched {}",
            pattern
        )));
    }

    host.default_output_device()
        .ok_or_else(|| SinkError::Device("no default output device available".to_string()))
}

fn device_error<E: std::fmt::Display>(err: E) -> SinkError {
    SinkError::Device(err.to_string())
}
