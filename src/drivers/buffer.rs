use crate::config::PipelineConfig;
use crate::types::{RawSample, CHANNELS};
/// Exactly `timesteps` consecutive samples, the unit of normalization and classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    samples: Vec<RawSample>,
}
impl Window {
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().map(move |s| s.channels[index])
    }
}
/// Groups raw samples into fixed-length windows.
///
/// Bounded mode shapes a whole recording into one window by truncating the tail or
/// zero-padding. Streaming mode emits a window every `timesteps` pushes; a partial
/// buffer is never emitted.
pub struct WindowSegmenter {
    timesteps: usize,
    buffer: Vec<RawSample>,
    emitted: usize,
}
impl WindowSegmenter {
    pub fn new(timesteps: usize) -> Self {
        Self {
            timesteps,
            buffer: Vec::with_capacity(timesteps),
            emitted: 0,
        }
    }
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.timesteps)
    }
    pub fn timesteps(&self) -> usize {
        self.timesteps
    }
    /// Bounded mode: keep the earliest `timesteps` samples, zero-pad if short.
    pub fn bounded(&self, samples: impl IntoIterator<Item = RawSample>) -> Window {
        let mut samples: Vec<RawSample> = samples.into_iter().take(self.timesteps).collect();
        samples.resize(self.timesteps, RawSample::zero());
        Window { samples }
    }
    /// Streaming mode: returns the completed window the moment the buffer fills.
    pub fn push(&mut self, sample: RawSample) -> Option<Window> {
        self.buffer.push(sample);
        if self.buffer.len() < self.timesteps {
            return None;
        }
        let samples = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.timesteps));
        self.emitted += 1;
        Some(Window { samples })
    }
    /// Samples accumulated toward the next window.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
    pub fn emitted(&self) -> usize {
        self.emitted
    }
    /// Drops the in-progress buffer, returning how many samples were discarded.
    pub fn discard_partial(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}
/// Convenience for tests and replay: a constant-valued sample.
pub fn constant_sample(value: f32) -> RawSample {
    RawSample::new([value; CHANNELS])
}
