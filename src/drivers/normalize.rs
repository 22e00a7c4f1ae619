//! Per-window, per-channel min-max scaling to [0, 1].
//!
//! The scaling only looks at the window being scaled. A constant channel keeps a
//! scale of 1, so it maps to all zeros instead of NaN.
use ndarray::{Array2, ArrayView2, Axis};
use crate::drivers::buffer::Window;
use crate::types::CHANNELS;
/// Observed extent of one channel inside one window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelRange {
    pub min: f32,
    pub max: f32,
}
impl ChannelRange {
    /// Divisor used for this channel; 1 when the channel is flat.
    pub fn scale(&self) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }
}
/// A window rescaled channel by channel, shape `(timesteps, CHANNELS)`.
#[derive(Clone, Debug)]
pub struct NormalizedWindow {
    values: Array2<f32>,
    ranges: [ChannelRange; CHANNELS],
}
impl NormalizedWindow {
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }
    pub fn ranges(&self) -> &[ChannelRange; CHANNELS] {
        &self.ranges
    }
    pub fn timesteps(&self) -> usize {
        self.values.nrows()
    }
    /// Undo the scaling with the recorded ranges.
    pub fn denormalize(&self) -> Array2<f32> {
        let mut raw = self.values.clone();
        for (c, mut column) in raw.axis_iter_mut(Axis(1)).enumerate() {
            let range = self.ranges[c];
            column.mapv_inplace(|v| v * range.scale() + range.min);
        }
        raw
    }
}
/// Stacks a window into a `(timesteps, CHANNELS)` matrix, time along rows.
pub fn window_matrix(window: &Window) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((window.len(), CHANNELS));
    for (mut row, sample) in data.axis_iter_mut(Axis(0)).zip(window.samples()) {
        for (slot, value) in row.iter_mut().zip(sample.channels.iter()) {
            *slot = *value;
        }
    }
    data
}
/// Min-max scales each column of `data` independently.
pub fn normalize_matrix(data: ArrayView2<f32>) -> (Array2<f32>, [ChannelRange; CHANNELS]) {
    let mut ranges = [ChannelRange { min: 0.0, max: 0.0 }; CHANNELS];
    let mut out = data.to_owned();
    for (c, mut column) in out.axis_iter_mut(Axis(1)).enumerate().take(CHANNELS) {
        let min = column.iter().copied().fold(f32::INFINITY, f32::min);
        let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = ChannelRange { min, max };
        let scale = range.scale();
        column.mapv_inplace(|v| (v - min) / scale);
        ranges[c] = range;
    }
    (out, ranges)
}
pub fn normalize_window(window: &Window) -> NormalizedWindow {
    let (values, ranges) = normalize_matrix(window_matrix(window).view());
    NormalizedWindow { values, ranges }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::buffer::WindowSegmenter;
    use crate::types::RawSample;
    use ndarray::array;
    #[test]
    fn scales_each_channel_to_unit_range() {
        let samples = (0..5).map(|i| {
            let t = i as f32;
            RawSample::new([t, 10.0 - t, 2.0 * t, -t, t * t, 3.0])
        });
        let window = WindowSegmenter::new(5).bounded(samples);
        let norm = normalize_window(&window);
        let values = norm.values();
        assert_eq!(values.shape(), &[5, CHANNELS]);
        for c in 0..5 {
            let col = values.column(c);
            let min = col.iter().copied().fold(f32::INFINITY, f32::min);
            let max = col.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            assert!(min.abs() < 1e-6 && (max - 1.0).abs() < 1e-6, "channel {c}");
        }
        assert_eq!(values[[2, 0]], 0.5);
        assert_eq!(values[[0, 1]], 1.0);
    }
    #[test]
    fn flat_channel_becomes_zero_not_nan() {
        let data = array![[5.0f32, 1.0, 0.0, 0.0, 0.0, 0.0], [5.0, 2.0, 0.0, 0.0, 0.0, 0.0]];
        let (out, ranges) = normalize_matrix(data.view());
        assert!(out.column(0).iter().all(|v| *v == 0.0));
        assert!(out.iter().all(|v| v.is_finite()));
        assert_eq!(ranges[0].scale(), 1.0);
    }
    #[test]
    fn already_normalized_data_is_unchanged() {
        let data = array![
            [0.0f32, 1.0, 0.25, 0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0, 0.5, 0.0, 1.0],
            [0.5, 0.5, 0.0, 1.0, 0.75, 0.5]
        ];
        let (out, _) = normalize_matrix(data.view());
        assert_eq!(out, data);
    }
    #[test]
    fn denormalize_recovers_raw_values() {
        let samples = (0..8).map(|i| {
            let t = i as f32;
            RawSample::new([t * 0.5 - 1.0, 9.81, t.sin(), 100.0 - t, 0.0, t * 3.0])
        });
        let window = WindowSegmenter::new(8).bounded(samples);
        let raw = window_matrix(&window);
        let back = normalize_window(&window).denormalize();
        for (a, b) in raw.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
