use std::fmt;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use crate::classifier::dense::{backend_error, row_to_dense, to_dense, ClassIndex};
use crate::classifier::{check_query, check_training_input, Classifier};
use crate::drivers::PipelineError;
/// Seed for bootstrap sampling and feature bagging.
pub const FOREST_SEED: u64 = 42;
type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;
/// Bagged decision trees, majority vote.
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    trees: u16,
    max_depth: Option<u16>,
    input_dim: usize,
    classes: ClassIndex,
    inner: Option<Forest>,
}
impl RandomForest {
    pub fn new(trees: u16, max_depth: Option<u16>) -> Self {
        Self {
            trees: trees.max(1),
            max_depth,
            input_dim: 0,
            classes: ClassIndex::default(),
            inner: None,
        }
    }
    fn parameters(&self) -> RandomForestClassifierParameters {
        let params = RandomForestClassifierParameters::default()
            .with_n_trees(self.trees)
            .with_seed(FOREST_SEED);
        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
    fn fitted(&self) -> Result<&Forest, PipelineError> {
        self.inner
            .as_ref()
            .ok_or_else(|| PipelineError::Model("random forest has not been fitted".into()))
    }
}
impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("trees", &self.trees)
            .field("max_depth", &self.max_depth)
            .field("input_dim", &self.input_dim)
            .field("classes", &self.classes)
            .field("fitted", &self.inner.is_some())
            .finish()
    }
}
impl Classifier for RandomForest {
    fn name(&self) -> String {
        match self.max_depth {
            Some(depth) => format!("Random Forest ({} trees, depth {depth})", self.trees),
            None => format!("Random Forest ({} trees)", self.trees),
        }
    }
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError> {
        check_training_input(features, labels)?;
        let (classes, codes) = ClassIndex::encode(labels);
        let forest = Forest::fit(&to_dense(features), &codes, self.parameters())
            .map_err(backend_error)?;
        self.inner = Some(forest);
        self.classes = classes;
        self.input_dim = features.ncols();
        Ok(())
    }
    fn input_dim(&self) -> usize {
        self.input_dim
    }
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError> {
        let forest = self.fitted()?;
        check_query(features, self.input_dim)?;
        let codes = forest.predict(&row_to_dense(features)).map_err(backend_error)?;
        match codes.first() {
            Some(code) => self.classes.decode(*code),
            None => Err(PipelineError::Model("random forest returned no prediction".into())),
        }
    }
    fn predict(&self, features: ArrayView2<f32>) -> Result<Vec<String>, PipelineError> {
        let forest = self.fitted()?;
        if features.ncols() != self.input_dim {
            return Err(PipelineError::DimensionMismatch {
                expected: self.input_dim,
                actual: features.ncols(),
            });
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }
        forest
            .predict(&to_dense(features))
            .map_err(backend_error)?
            .into_iter()
            .map(|code| self.classes.decode(code))
            .collect()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }
    #[test]
    fn separates_two_clusters() {
        let x = array![
            [0.0f32, 0.1],
            [0.1, 0.0],
            [0.05, 0.05],
            [0.1, 0.1],
            [0.9, 1.0],
            [1.0, 0.9],
            [0.95, 0.95],
            [0.9, 0.9]
        ];
        let y = labels(&["help", "help", "help", "help", "pain", "pain", "pain", "pain"]);
        let mut forest = RandomForest::new(25, None);
        forest.fit(x.view(), &y).unwrap();
        assert_eq!(forest.input_dim(), 2);
        assert_eq!(forest.predict_one(array![0.02f32, 0.08].view()).unwrap(), "help");
        assert_eq!(forest.predict_one(array![0.97f32, 0.92].view()).unwrap(), "pain");
        assert!(matches!(
            forest.predict_one(array![0.5f32].view()),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
    #[test]
    fn unfitted_forest_errors() {
        let forest = RandomForest::new(10, Some(4));
        assert!(forest.predict_one(array![0.0f32].view()).is_err());
        assert_eq!(forest.name(), "Random Forest (10 trees, depth 4)");
    }
}
