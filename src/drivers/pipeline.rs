use crate::config::PipelineConfig;
use crate::drivers::buffer::{Window, WindowSegmenter};
use crate::drivers::error::PipelineError;
use crate::drivers::features::{count_non_finite, vectorize, FeatureVector};
use crate::drivers::normalize::normalize_window;
use crate::drivers::source::SampleSource;
use crate::types::RawSample;
/// Normalize then flatten. Training and prediction both call this.
pub fn window_to_features(window: &Window) -> FeatureVector {
    features_with_report(window).0
}
/// Same as [`window_to_features`], also returning how many values were sanitized.
pub fn features_with_report(window: &Window) -> (FeatureVector, usize) {
    let normalized = normalize_window(window);
    let non_finite = count_non_finite(&normalized);
    (vectorize(&normalized), non_finite)
}
/// Bounded mode end to end: shape a finite recording into one feature vector.
pub fn recording_to_features(
    config: &PipelineConfig,
    samples: impl IntoIterator<Item = RawSample>,
) -> FeatureVector {
    let window = WindowSegmenter::from_config(config).bounded(samples);
    window_to_features(&window)
}
/// Streaming pipeline that pulls samples from a source and yields whole windows.
pub struct WindowPipeline<S: SampleSource> {
    source: S,
    segmenter: WindowSegmenter,
}
impl<S: SampleSource> WindowPipeline<S> {
    pub fn new(source: S, config: &PipelineConfig) -> Self {
        Self {
            source,
            segmenter: WindowSegmenter::from_config(config),
        }
    }
    /// Blocks on the source until a window completes. `None` once the source ends;
    /// whatever was buffered at that point is dropped.
    pub fn pump_window(&mut self) -> Result<Option<Window>, PipelineError> {
        loop {
            let sample = match self.source.next_sample() {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    self.segmenter.discard_partial();
                    return Ok(None);
                }
                Err(e) => {
                    self.segmenter.discard_partial();
                    return Err(e);
                }
            };
            if let Some(window) = self.segmenter.push(sample) {
                return Ok(Some(window));
            }
        }
    }
    pub fn pump_features(&mut self) -> Result<Option<FeatureVector>, PipelineError> {
        Ok(self.pump_window()?.map(|w| window_to_features(&w)))
    }
    pub fn pending(&self) -> usize {
        self.segmenter.pending()
    }
    pub fn windows_emitted(&self) -> usize {
        self.segmenter.emitted()
    }
    pub fn source(&self) -> &S {
        &self.source
    }
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
