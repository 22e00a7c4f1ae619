// src/drivers/mod.rs
pub mod buffer;
pub mod error;
pub mod features;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub use buffer::{Window, WindowSegmenter};
pub use error::PipelineError;
pub use features::{vectorize, FeatureVector};
pub use normalize::{normalize_window, ChannelRange, NormalizedWindow};
pub use pipeline::{features_with_report, recording_to_features, window_to_features, WindowPipeline};
pub use source::{
    open_serial, parse_line, LineSource, ManualSource, ReplaySource, SampleSource, SerialSource,
    SourceStats,
};
