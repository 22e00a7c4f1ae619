//! Wearable IMU gesture recognition.
//!
//! Raw 6-channel samples (3-axis accelerometer, 3-axis gyroscope) are grouped into
//! fixed-length windows, min-max normalized per window, and flattened into feature
//! vectors. The same pipeline feeds three jobs:
//!
//! - collection: live windows saved as labeled sample files ([`recorder`])
//! - training: manifest + sample files into a dataset, then classifiers ([`dataset`],
//!   [`classifier`])
//! - prediction: live windows classified one by one ([`engine`])
//!
//! ```text
//! SampleSource ──▶ WindowSegmenter ──▶ normalize ──▶ vectorize ──┬──▶ DatasetBuilder ──▶ harness
//!                                                                └──▶ PredictionService
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod drivers;
pub mod engine;
pub mod recorder;
pub mod types;

pub use classifier::{ModelSpec, TrainedModel};
pub use config::PipelineConfig;
pub use dataset::{Dataset, DatasetBuilder};
pub use drivers::{FeatureVector, PipelineError, SampleSource, Window, WindowSegmenter};
pub use engine::PredictionService;
pub use types::{RawSample, CHANNELS, CHANNEL_NAMES};
