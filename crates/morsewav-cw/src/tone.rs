//! Click-free tone rendering.
//!
//! Tones use a cosine carrier shaped by a linear attack and release so that every
//! tone starts and ends at zero amplitude.

use std::collections::HashMap;
use std::sync::Arc;

/// Everything that determines the samples of one rendered tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f64,
    pub amplitude: u32,
    pub sample_rate: u32,
    pub duration_samples: usize,
    pub ramp_samples: usize,
}

impl ToneSpec {
    /// Ramp length actually used, so that attack and release fit in the tone.
    pub fn effective_ramp(&self) -> usize {
        self.ramp_samples.min(self.duration_samples / 2)
    }

    fn key(&self) -> ToneKey {
        ToneKey {
            frequency_bits: self.frequency_hz.to_bits(),
            amplitude: self.amplitude,
            sample_rate: self.sample_rate,
            duration_samples: self.duration_samples,
            ramp_samples: self.ramp_samples,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ToneKey {
    frequency_bits: u64,
    amplitude: u32,
    sample_rate: u32,
    duration_samples: usize,
    ramp_samples: usize,
}

/// Rendered 16-bit mono samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToneBuffer {
    samples: Vec<i16>,
}

impl ToneBuffer {
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![0; len],
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Serialise as little-endian 16-bit PCM.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}

/// Render a ramped tone starting at `start_phase` (an absolute sample index).
///
/// Returns the buffer and the phase to pass to the next call for a continuous
/// carrier. If the tone is too short for its ramps, the ramps shrink to fit; a tone
/// shorter than two samples has no ramp at all.
pub fn render_tone(spec: &ToneSpec, start_phase: u64) -> (ToneBuffer, u64) {
    let ramp = spec.effective_ramp();
    let flat = spec.duration_samples - 2 * ramp;
    let amplitude = f64::from(spec.amplitude);

    let mut samples = Vec::with_capacity(spec.duration_samples);
    let mut phase = start_phase;
    phase = render_segment(&mut samples, spec, phase, ramp, |i| {
        amplitude * i as f64 / ramp as f64
    });
    phase = render_segment(&mut samples, spec, phase, flat, |_| amplitude);
    phase = render_segment(&mut samples, spec, phase, ramp, |i| {
        amplitude * (ramp - i) as f64 / ramp as f64
    });

    (ToneBuffer { samples }, phase)
}

fn render_segment<F>(
    out: &mut Vec<i16>,
    spec: &ToneSpec,
    start_phase: u64,
    len: usize,
    envelope: F,
) -> u64
where
    F: Fn(usize) -> f64,
{
    let radians_per_sample =
        std::f64::consts::TAU * spec.frequency_hz / f64::from(spec.sample_rate);
    for i in 0..len {
        let phase = start_phase + i as u64;
        let value = (radians_per_sample * phase as f64).cos() * envelope(i);
        out.push(value.round() as i16);
    }
    start_phase + len as u64
}

/// Memoised tone buffers, one per distinct [`ToneSpec`].
#[derive(Debug, Default)]
pub struct ToneCache {
    tones: HashMap<ToneKey, Arc<ToneBuffer>>,
}

impl ToneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the buffer for `spec`, rendering it from phase zero on first use.
    pub fn get_or_render(&mut self, spec: &ToneSpec) -> Arc<ToneBuffer> {
        self.tones
            .entry(spec.key())
            .or_insert_with(|| {
                log::debug!(
                    "rendering {} Hz tone of {} samples (ramp {})",
                    spec.frequency_hz,
                    spec.duration_samples,
                    spec.effective_ramp()
                );
                Arc::new(render_tone(spec, 0).0)
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }
}
