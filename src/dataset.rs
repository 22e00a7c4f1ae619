//! Training set assembly: label manifest + per-identifier sample files.
//!
//! Each sample file becomes exactly one feature vector via the shared bounded-mode
//! pipeline. Entries whose file is missing or lacks the IMU columns are skipped and
//! recorded, never fatal.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use ndarray::Array2;

use crate::config::PipelineConfig;
use crate::drivers::{features_with_report, FeatureVector, PipelineError, WindowSegmenter};
use crate::types::{RawSample, CHANNELS, CHANNEL_NAMES};

/// One row of the label manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub identifier: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingFile,
    MissingColumns(Vec<String>),
    Unreadable(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    pub identifier: String,
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Feature matrix and parallel label vector.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Shape `(examples, timesteps * CHANNELS)`
    pub features: Array2<f32>,
    pub labels: Vec<String>,
    pub identifiers: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    non_finite: usize,
}

impl Dataset {
    pub fn empty(dim: usize) -> Self {
        Self {
            features: Array2::zeros((0, dim)),
            labels: Vec::new(),
            identifiers: Vec::new(),
            skipped: Vec::new(),
            non_finite: 0,
        }
    }

    /// Builds a dataset from already vectorized examples. All rows must share a length.
    pub fn from_examples(examples: Vec<LabeledExample>) -> Result<Self, PipelineError> {
        let dim = examples.first().map(|e| e.features.len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(examples.len() * dim);
        let mut labels = Vec::with_capacity(examples.len());
        for example in &examples {
            example.features.expect_len(dim)?;
            flat.extend_from_slice(example.features.as_slice());
            labels.push(example.label.clone());
        }
        let features = Array2::from_shape_vec((examples.len(), dim), flat)
            .map_err(|e| PipelineError::Model(e.to_string()))?;
        let identifiers = (0..labels.len()).map(|i| i.to_string()).collect();
        Ok(Self {
            features,
            labels,
            identifiers,
            skipped: Vec::new(),
            non_finite: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// NaN/Inf values replaced with 0 while vectorizing.
    pub fn non_finite_count(&self) -> usize {
        self.non_finite
    }

    /// Distinct labels, sorted.
    pub fn classes(&self) -> Vec<String> {
        self.labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(ndarray::Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
            identifiers: indices.iter().map(|&i| self.identifiers[i].clone()).collect(),
            skipped: Vec::new(),
            non_finite: 0,
        }
    }
}

fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Reads a manifest with at least `filename` and `label` columns.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<ManifestEntry>, PipelineError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let filename_idx = header_index(&headers, "filename");
    let label_idx = header_index(&headers, "label");
    let (Some(filename_idx), Some(label_idx)) = (filename_idx, label_idx) else {
        let missing = [("filename", filename_idx), ("label", label_idx)]
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(PipelineError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    };
    let mut entries = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        match (record.get(filename_idx), record.get(label_idx)) {
            (Some(identifier), Some(label)) if !identifier.is_empty() => {
                entries.push(ManifestEntry {
                    identifier: identifier.to_string(),
                    label: label.to_string(),
                })
            }
            _ => warn!("{}: manifest row {} is incomplete, skipping", path.display(), row + 2),
        }
    }
    Ok(entries)
}

/// Reads a sample table. Column order is free; headers are trimmed and matched
/// case-insensitively. Rows with unparseable channel cells are skipped.
pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<RawSample>, PipelineError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut columns = [0usize; CHANNELS];
    let mut missing = Vec::new();
    for (slot, name) in columns.iter_mut().zip(CHANNEL_NAMES) {
        match header_index(&headers, name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }
    let time_column = headers
        .iter()
        .position(|h| h.trim().to_ascii_lowercase().starts_with("time"));
    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut channels = [0.0f32; CHANNELS];
        let mut bad_cell = None;
        for (slot, &idx) in channels.iter_mut().zip(columns.iter()) {
            match record.get(idx).and_then(|cell| cell.parse::<f32>().ok()) {
                Some(value) => *slot = value,
                None => {
                    bad_cell = Some(idx);
                    break;
                }
            }
        }
        if let Some(idx) = bad_cell {
            warn!(
                "{}: row {} has an unreadable value in column {:?}, skipping",
                path.display(),
                row + 2,
                headers.get(idx).unwrap_or("?")
            );
            continue;
        }
        let timestamp = time_column
            .and_then(|idx| record.get(idx))
            .and_then(|cell| cell.parse::<f64>().ok());
        samples.push(RawSample {
            timestamp,
            channels,
        });
    }
    Ok(samples)
}

/// Joins a manifest with its sample directory into a [`Dataset`].
pub struct DatasetBuilder<'a> {
    config: &'a PipelineConfig,
    data_dir: PathBuf,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(config: &'a PipelineConfig, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            data_dir: data_dir.into(),
        }
    }

    pub fn build_from_manifest(&self, manifest: impl AsRef<Path>) -> Result<Dataset, PipelineError> {
        let entries = load_manifest(manifest)?;
        self.build(&entries)
    }

    /// Builds the dataset. Row order follows the manifest, minus skipped entries.
    ///
    /// A config that cannot describe 6-channel windows is rejected before any file is
    /// read.
    pub fn build(&self, entries: &[ManifestEntry]) -> Result<Dataset, PipelineError> {
        self.config.validate()?;
        let dim = self.config.feature_len();
        let segmenter = WindowSegmenter::from_config(self.config);
        let mut flat = Vec::with_capacity(entries.len() * dim);
        let mut dataset = Dataset::empty(dim);
        for entry in entries {
            let path = self.config.sample_path(&self.data_dir, &entry.identifier);
            let reason = if !path.is_file() {
                Some(SkipReason::MissingFile)
            } else {
                match load_samples(&path) {
                    Ok(samples) => {
                        let window = segmenter.bounded(samples);
                        let (features, non_finite) = features_with_report(&window);
                        flat.extend_from_slice(features.as_slice());
                        dataset.non_finite += non_finite;
                        dataset.labels.push(entry.label.clone());
                        dataset.identifiers.push(entry.identifier.clone());
                        None
                    }
                    Err(PipelineError::MissingColumns { missing, .. }) => {
                        Some(SkipReason::MissingColumns(missing))
                    }
                    Err(e) => Some(SkipReason::Unreadable(e.to_string())),
                }
            };
            if let Some(reason) = reason {
                match &reason {
                    SkipReason::MissingFile => warn!("file not found: {}", path.display()),
                    SkipReason::MissingColumns(missing) => warn!(
                        "{} lacks required columns {}, skipping",
                        path.display(),
                        missing.join(", ")
                    ),
                    SkipReason::Unreadable(e) => {
                        warn!("could not read {}: {e}, skipping", path.display())
                    }
                }
                dataset.skipped.push(SkippedEntry {
                    identifier: entry.identifier.clone(),
                    path,
                    reason,
                });
            }
        }
        let rows = dataset.labels.len();
        let actual = flat.len();
        dataset.features = Array2::from_shape_vec((rows, dim), flat).map_err(|_| {
            PipelineError::DimensionMismatch {
                expected: rows * dim,
                actual,
            }
        })?;
        info!(
            "loaded {} examples from {} ({} skipped, {} non-finite values zeroed)",
            rows,
            self.data_dir.display(),
            dataset.skipped.len(),
            dataset.non_finite
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("imu-gesture-dataset-{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn manifest_columns_are_trimmed_and_case_insensitive() {
        let dir = scratch_dir("manifest");
        let path = dir.join("train.csv");
        fs::write(&path, " FileName , extra, Label \nhelp_1,x,help\nwater_2,y, water \n").unwrap();
        let entries = load_manifest(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    identifier: "help_1".into(),
                    label: "help".into()
                },
                ManifestEntry {
                    identifier: "water_2".into(),
                    label: "water".into()
                },
            ]
        );
    }

    #[test]
    fn manifest_without_label_column_is_rejected() {
        let dir = scratch_dir("manifest-bad");
        let path = dir.join("bad.csv");
        fs::write(&path, "filename,other\nhelp_1,x\n").unwrap();
        match load_manifest(&path) {
            Err(PipelineError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["label".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn samples_with_shuffled_padded_headers() {
        let dir = scratch_dir("samples");
        let path = dir.join("s.txt");
        fs::write(
            &path,
            " Gyro_Z, acce_x ,Acce_Y,Acce_Z,Gyro_X,Gyro_Y,Time (ms), note\n6,1,2,3,4,5,0,a\n60,10,20,30,40,50,10,b\n",
        )
        .unwrap();
        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].channels, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(samples[1].channels, [10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(samples[1].timestamp, Some(10.0));
    }

    #[test]
    fn unparseable_rows_are_skipped() {
        let dir = scratch_dir("badrows");
        let path = dir.join("s.txt");
        fs::write(
            &path,
            "Acce_X,Acce_Y,Acce_Z,Gyro_X,Gyro_Y,Gyro_Z\n1,1,1,1,1,1\nnan?,1,1,1,1,1\n2,2,2,2,2,2\n",
        )
        .unwrap();
        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].channels[0], 2.0);
    }

    #[test]
    fn builder_skips_and_keeps_manifest_order() {
        let dir = scratch_dir("builder");
        let header = "Acce_X,Acce_Y,Acce_Z,Gyro_X,Gyro_Y,Gyro_Z\n";
        fs::write(dir.join("a.txt"), format!("{header}1,2,3,4,5,6\n2,3,4,5,6,7\n")).unwrap();
        fs::write(dir.join("c.txt"), format!("{header}0,0,0,0,0,0\n")).unwrap();
        fs::write(dir.join("d.txt"), "Acce_X,Acce_Y\n1,2\n").unwrap();
        let config = PipelineConfig {
            timesteps: 10,
            ..Default::default()
        };
        let entries: Vec<ManifestEntry> = [("a", "help"), ("b", "pain"), ("c", "water"), ("d", "help")]
            .iter()
            .map(|(id, label)| ManifestEntry {
                identifier: id.to_string(),
                label: label.to_string(),
            })
            .collect();
        let dataset = DatasetBuilder::new(&config, &dir).build(&entries).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels, vec!["help", "water"]);
        assert_eq!(dataset.identifiers, vec!["a", "c"]);
        assert_eq!(dataset.features.shape(), &[2, 60]);
        assert_eq!(dataset.skipped_count(), 2);
        assert_eq!(dataset.skipped[0].reason, SkipReason::MissingFile);
        assert!(matches!(dataset.skipped[1].reason, SkipReason::MissingColumns(_)));
        assert_eq!(dataset.classes(), vec!["help", "water"]);
    }

    #[test]
    fn builder_rejects_config_with_wrong_channel_count() {
        let dir = scratch_dir("builder-channels");
        fs::write(
            dir.join("a.txt"),
            "Acce_X,Acce_Y,Acce_Z,Gyro_X,Gyro_Y,Gyro_Z\n1,2,3,4,5,6\n",
        )
        .unwrap();
        let config = PipelineConfig {
            timesteps: 4,
            channels: 7,
            ..Default::default()
        };
        let entries = vec![ManifestEntry {
            identifier: "a".into(),
            label: "help".into(),
        }];
        let result = DatasetBuilder::new(&config, &dir).build(&entries);
        assert!(matches!(
            result,
            Err(PipelineError::ChannelMismatch {
                expected: 6,
                actual: 7
            })
        ));
        let config = PipelineConfig {
            timesteps: 4,
            ..Default::default()
        };
        let dataset = DatasetBuilder::new(&config, &dir).build(&entries).unwrap();
        assert_eq!(dataset.labels.len(), dataset.features.nrows());
        assert_eq!(dataset.features.shape(), &[1, 24]);
    }

    #[test]
    fn subset_and_from_examples() {
        let examples = vec![
            LabeledExample {
                features: FeatureVector::from_values(vec![0.0, 1.0]),
                label: "a".into(),
            },
            LabeledExample {
                features: FeatureVector::from_values(vec![1.0, 0.0]),
                label: "b".into(),
            },
        ];
        let dataset = Dataset::from_examples(examples).unwrap();
        let sub = dataset.subset(&[1]);
        assert_eq!(sub.labels, vec!["b"]);
        assert_eq!(sub.features.row(0).to_vec(), vec![1.0, 0.0]);
        let ragged = vec![
            LabeledExample {
                features: FeatureVector::from_values(vec![0.0, 1.0]),
                label: "a".into(),
            },
            LabeledExample {
                features: FeatureVector::from_values(vec![1.0]),
                label: "b".into(),
            },
        ];
        assert!(matches!(
            Dataset::from_examples(ragged),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }
}
