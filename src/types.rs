// src/types.rs
use serde::{Deserialize, Serialize};

/// Number of IMU channels carried by every sample.
pub const CHANNELS: usize = 6;

/// Default window length in samples.
pub const DEFAULT_TIMESTEPS: usize = 400;

/// Column names in on-disk order. Also the channel order inside a sample.
pub const CHANNEL_NAMES: [&str; CHANNELS] =
    ["Acce_X", "Acce_Y", "Acce_Z", "Gyro_X", "Gyro_Y", "Gyro_Z"];

/// Header written in front of collected sample files.
pub const SAMPLE_FILE_HEADER: &str = "Time (ms), Acce_X, Acce_Y, Acce_Z, Gyro_X, Gyro_Y, Gyro_Z";

/// One 6-channel reading from the wearable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: Option<f64>,
    pub channels: [f32; CHANNELS],
}

impl RawSample {
    pub fn new(channels: [f32; CHANNELS]) -> Self {
        Self {
            timestamp: None,
            channels,
        }
    }

    pub fn with_timestamp(timestamp: f64, channels: [f32; CHANNELS]) -> Self {
        Self {
            timestamp: Some(timestamp),
            channels,
        }
    }

    /// Zero-valued padding sample.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Messages the live loops report back to whoever drives them.
#[derive(Clone, Debug, PartialEq)]
pub enum PredictionEvent {
    Label { index: usize, label: String },
    Finished { windows: usize, reason: StopReason },
}

/// Why a live loop stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum StopReason {
    EndOfStream,
    Cancelled,
    Transport(String),
}
