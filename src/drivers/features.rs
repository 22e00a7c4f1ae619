use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use crate::drivers::normalize::NormalizedWindow;
use crate::drivers::PipelineError;
use crate::types::CHANNELS;
/// Flattened, sanitized window: the only input a classifier sees.
///
/// Layout is time-major: element `t * CHANNELS + c` is channel `c` of sample `t`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f32>,
}
impl FeatureVector {
    pub fn from_values(values: Vec<f32>) -> Self {
        Self {
            values: values.into_iter().map(sanitize).collect(),
        }
    }
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
    pub fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(&self.values[..])
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Value of channel `c` at sample `t`.
    pub fn at(&self, t: usize, c: usize) -> f32 {
        self.values[t * CHANNELS + c]
    }
    pub fn expect_len(&self, expected: usize) -> Result<(), PipelineError> {
        if self.values.len() != expected {
            return Err(PipelineError::DimensionMismatch {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}
fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
/// Flattens a normalized window row by row, replacing NaN and infinities with 0.
pub fn vectorize(window: &NormalizedWindow) -> FeatureVector {
    FeatureVector {
        values: window.values().iter().copied().map(sanitize).collect(),
    }
}
/// How many entries of `window` are not finite before sanitization.
pub fn count_non_finite(window: &NormalizedWindow) -> usize {
    window.values().iter().filter(|v| !v.is_finite()).count()
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::buffer::WindowSegmenter;
    use crate::drivers::normalize::normalize_window;
    use crate::types::RawSample;
    #[test]
    fn length_is_timesteps_times_channels() {
        let segmenter = WindowSegmenter::new(400);
        let window = segmenter.bounded((0..37).map(|i| RawSample::new([i as f32; CHANNELS])));
        let features = vectorize(&normalize_window(&window));
        assert_eq!(features.len(), 400 * CHANNELS);
        assert!(features.expect_len(2400).is_ok());
        assert!(matches!(
            features.expect_len(2401),
            Err(PipelineError::DimensionMismatch {
                expected: 2401,
                actual: 2400
            })
        ));
    }
    #[test]
    fn non_finite_input_is_sanitized() {
        let segmenter = WindowSegmenter::new(4);
        let window = segmenter.bounded(vec![
            RawSample::new([f32::NAN, 1.0, f32::INFINITY, 0.0, 0.0, 0.0]),
            RawSample::new([1.0, f32::NEG_INFINITY, 2.0, 0.0, 0.0, 0.0]),
            RawSample::new([2.0, 3.0, f32::NAN, 0.0, 0.0, 0.0]),
        ]);
        let normalized = normalize_window(&window);
        assert!(count_non_finite(&normalized) > 0);
        let features = vectorize(&normalized);
        assert_eq!(features.len(), 4 * CHANNELS);
        assert!(features.as_slice().iter().all(|v| v.is_finite()));
        let direct = FeatureVector::from_values(vec![f32::NAN, f32::INFINITY, 0.5]);
        assert_eq!(direct.as_slice(), &[0.0, 0.0, 0.5]);
    }
    #[test]
    fn flatten_order_is_time_major() {
        let samples: Vec<RawSample> = (0..3)
            .map(|t| {
                let mut channels = [0.0; CHANNELS];
                for (c, slot) in channels.iter_mut().enumerate() {
                    *slot = (t * 10 + c) as f32;
                }
                RawSample::new(channels)
            })
            .collect();
        let window = WindowSegmenter::new(3).bounded(samples);
        let features = vectorize(&normalize_window(&window));
        // every channel spans 0..20 so normalized value = t / 2
        for t in 0..3 {
            for c in 0..CHANNELS {
                assert_eq!(features.at(t, c), t as f32 / 2.0);
                assert_eq!(features.as_slice()[t * CHANNELS + c], features.at(t, c));
            }
        }
    }
}
