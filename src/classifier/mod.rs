//! Classifier boundary: anything that maps a feature vector to a label.
//!
//! The pipeline only depends on the [`Classifier`] trait and on [`TrainedModel`],
//! which pins a fitted classifier to the window shape it was trained on.

pub mod centroid;
pub mod dense;
pub mod forest;
pub mod harness;
pub mod knn;
pub mod logistic;

use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::drivers::{FeatureVector, PipelineError};

pub use centroid::NearestCentroid;
pub use forest::RandomForest;
pub use harness::{evaluate, forest_grid, grid_search, knn_grid, EvaluationReport, GridSearchResult};
pub use knn::{KnnClassifier, Weighting};
pub use logistic::Logistic;

pub trait Classifier {
    fn name(&self) -> String;
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError>;
    /// Width of the vectors seen during `fit`.
    fn input_dim(&self) -> usize;
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError>;

    fn predict(&self, features: ArrayView2<f32>) -> Result<Vec<String>, PipelineError> {
        if features.ncols() != self.input_dim() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.input_dim(),
                actual: features.ncols(),
            });
        }
        features
            .rows()
            .into_iter()
            .map(|row| self.predict_one(row))
            .collect()
    }
}

pub(crate) fn check_training_input(
    features: ArrayView2<f32>,
    labels: &[String],
) -> Result<(), PipelineError> {
    if features.nrows() == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    if features.nrows() != labels.len() {
        return Err(PipelineError::Model(format!(
            "{} feature rows but {} labels",
            features.nrows(),
            labels.len()
        )));
    }
    Ok(())
}

/// Rejects a query whose width differs from the training vectors.
pub(crate) fn check_query(features: ArrayView1<f32>, input_dim: usize) -> Result<(), PipelineError> {
    if features.len() != input_dim {
        return Err(PipelineError::DimensionMismatch {
            expected: input_dim,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Hyperparameters for one model family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelSpec {
    RandomForest { trees: u16, max_depth: Option<u16> },
    Knn { k: usize, weighting: Weighting },
    LogisticRegression { alpha: f64 },
    NearestCentroid,
}

impl ModelSpec {
    pub fn build(&self) -> FittedModel {
        match self {
            ModelSpec::RandomForest { trees, max_depth } => {
                FittedModel::RandomForest(RandomForest::new(*trees, *max_depth))
            }
            ModelSpec::Knn { k, weighting } => FittedModel::Knn(KnnClassifier::new(*k, *weighting)),
            ModelSpec::LogisticRegression { alpha } => {
                FittedModel::LogisticRegression(Logistic::new(*alpha))
            }
            ModelSpec::NearestCentroid => FittedModel::NearestCentroid(NearestCentroid::new()),
        }
    }

    /// The families compared by a default training run.
    pub fn zoo() -> Vec<ModelSpec> {
        vec![
            ModelSpec::RandomForest {
                trees: 100,
                max_depth: None,
            },
            ModelSpec::Knn {
                k: 25,
                weighting: Weighting::Uniform,
            },
            ModelSpec::LogisticRegression { alpha: 0.0 },
            ModelSpec::NearestCentroid,
        ]
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build().name())
    }
}

/// Concrete classifier state, serializable so it can cross process boundaries.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FittedModel {
    RandomForest(RandomForest),
    Knn(KnnClassifier),
    LogisticRegression(Logistic),
    NearestCentroid(NearestCentroid),
}

impl FittedModel {
    fn as_classifier(&self) -> &dyn Classifier {
        match self {
            FittedModel::RandomForest(m) => m,
            FittedModel::Knn(m) => m,
            FittedModel::LogisticRegression(m) => m,
            FittedModel::NearestCentroid(m) => m,
        }
    }

    fn as_classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            FittedModel::RandomForest(m) => m,
            FittedModel::Knn(m) => m,
            FittedModel::LogisticRegression(m) => m,
            FittedModel::NearestCentroid(m) => m,
        }
    }
}

impl Classifier for FittedModel {
    fn name(&self) -> String {
        self.as_classifier().name()
    }
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError> {
        self.as_classifier_mut().fit(features, labels)
    }
    fn input_dim(&self) -> usize {
        self.as_classifier().input_dim()
    }
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError> {
        self.as_classifier().predict_one(features)
    }
    fn predict(&self, features: ArrayView2<f32>) -> Result<Vec<String>, PipelineError> {
        self.as_classifier().predict(features)
    }
}

/// A fitted classifier bound to the window shape and label set it was trained with.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub spec: ModelSpec,
    pub timesteps: usize,
    pub channels: usize,
    pub input_dim: usize,
    pub classes: Vec<String>,
    model: FittedModel,
}

impl TrainedModel {
    pub fn train(
        spec: &ModelSpec,
        data: &Dataset,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if data.dim() != config.feature_len() {
            return Err(PipelineError::DimensionMismatch {
                expected: config.feature_len(),
                actual: data.dim(),
            });
        }
        let mut model = spec.build();
        model.fit(data.features.view(), &data.labels)?;
        Ok(Self {
            spec: spec.clone(),
            timesteps: config.timesteps,
            channels: config.channels,
            input_dim: data.dim(),
            classes: data.classes(),
            model,
        })
    }

    pub fn name(&self) -> String {
        self.model.name()
    }

    /// Classifies one window. A vector of the wrong width is a configuration drift
    /// and is always an error.
    pub fn predict(&self, features: &FeatureVector) -> Result<String, PipelineError> {
        features.expect_len(self.input_dim)?;
        self.model.predict_one(features.view())
    }

    pub fn predict_batch(&self, features: ArrayView2<f32>) -> Result<Vec<String>, PipelineError> {
        if features.ncols() != self.input_dim {
            return Err(PipelineError::DimensionMismatch {
                expected: self.input_dim,
                actual: features.ncols(),
            });
        }
        self.model.predict(features)
    }

    /// Fails unless `config` produces vectors this model was trained on.
    pub fn check_config(&self, config: &PipelineConfig) -> Result<(), PipelineError> {
        if self.timesteps != config.timesteps
            || self.channels != config.channels
            || self.input_dim != config.feature_len()
        {
            return Err(PipelineError::DimensionMismatch {
                expected: self.input_dim,
                actual: config.feature_len(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_vec(self)?)?;
        info!("model saved in {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let model: TrainedModel = serde_json::from_slice(&fs::read(path)?)?;
        if model.model.input_dim() != model.input_dim
            || model.input_dim != model.timesteps * model.channels
        {
            return Err(PipelineError::Model(format!(
                "{} is inconsistent: {} timesteps x {} channels but {} inputs",
                path.display(),
                model.timesteps,
                model.channels,
                model.input_dim
            )));
        }
        info!(
            "loaded {} from {} ({} classes)",
            model.name(),
            path.display(),
            model.classes.len()
        );
        Ok(model)
    }
}
