// src/recorder.rs
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::drivers::{PipelineError, Window};
use crate::types::SAMPLE_FILE_HEADER;

/// Writes captured windows as sample files the dataset loader can read back.
pub struct DataRecorder {
    output_dir: PathBuf,
    extension: String,
}

impl DataRecorder {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self, PipelineError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            extension: extension.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<phrase>_<index>`, the identifier a manifest row uses for this file.
    pub fn identifier(phrase: &str, index: usize) -> String {
        format!("{phrase}_{index}")
    }

    /// Saves raw samples; the time column is replaced by the row index.
    pub fn save_window(&self, window: &Window, phrase: &str, index: usize) -> Result<PathBuf, PipelineError> {
        let filename = format!("{}.{}", Self::identifier(phrase, index), self.extension);
        let path = self.output_dir.join(&filename);
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "{SAMPLE_FILE_HEADER}")?;
        for (row, sample) in window.samples().iter().enumerate() {
            write!(w, "{row}.00")?;
            for value in &sample.channels {
                write!(w, ",{value:.2}")?;
            }
            writeln!(w)?;
        }
        w.flush()?;
        info!("Saved {filename}");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_samples;
    use crate::drivers::WindowSegmenter;
    use crate::types::RawSample;

    #[test]
    fn saved_window_loads_back() {
        let dir = std::env::temp_dir().join("imu-gesture-recorder-test");
        let _ = fs::remove_dir_all(&dir);
        let recorder = DataRecorder::new(&dir, "txt").unwrap();
        let window = WindowSegmenter::new(3).bounded(vec![
            RawSample::with_timestamp(5010.0, [0.12, -0.5, 9.81, 1.0, 2.0, 3.0]),
            RawSample::with_timestamp(5020.0, [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            RawSample::with_timestamp(5030.0, [-1.239, 4.0, 4.0, 4.0, 4.0, 4.0]),
        ]);
        let path = recorder.save_window(&window, "call_nurse", 21).unwrap();
        assert_eq!(path, dir.join("call_nurse_21.txt"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Time (ms), Acce_X"));
        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].channels, [0.12, -0.5, 9.81, 1.0, 2.0, 3.0]);
        assert_eq!(samples[2].channels[0], -1.24);
        assert_eq!(samples[2].timestamp, Some(2.0));
    }
}
