use std::fmt;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use crate::classifier::dense::{backend_error, row_to_dense, to_dense, ClassIndex};
use crate::classifier::{check_query, check_training_input, Classifier};
use crate::drivers::PipelineError;
type Linear = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;
/// Multinomial logistic regression with an L2 penalty of `alpha`.
#[derive(Serialize, Deserialize)]
pub struct Logistic {
    alpha: f64,
    input_dim: usize,
    classes: ClassIndex,
    inner: Option<Linear>,
}
impl Logistic {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.max(0.0),
            input_dim: 0,
            classes: ClassIndex::default(),
            inner: None,
        }
    }
    fn fitted(&self) -> Result<&Linear, PipelineError> {
        self.inner
            .as_ref()
            .ok_or_else(|| PipelineError::Model("logistic regression has not been fitted".into()))
    }
}
impl fmt::Debug for Logistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logistic")
            .field("alpha", &self.alpha)
            .field("input_dim", &self.input_dim)
            .field("classes", &self.classes)
            .field("fitted", &self.inner.is_some())
            .finish()
    }
}
impl Classifier for Logistic {
    fn name(&self) -> String {
        format!("Logistic Regression (alpha={})", self.alpha)
    }
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError> {
        check_training_input(features, labels)?;
        let (classes, codes) = ClassIndex::encode(labels);
        if classes.classes().len() < 2 {
            return Err(PipelineError::Model(
                "logistic regression needs at least two classes".into(),
            ));
        }
        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = Linear::fit(&to_dense(features), &codes, params).map_err(backend_error)?;
        self.inner = Some(model);
        self.classes = classes;
        self.input_dim = features.ncols();
        Ok(())
    }
    fn input_dim(&self) -> usize {
        self.input_dim
    }
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError> {
        let model = self.fitted()?;
        check_query(features, self.input_dim)?;
        let codes = model.predict(&row_to_dense(features)).map_err(backend_error)?;
        match codes.first() {
            Some(code) => self.classes.decode(*code),
            None => Err(PipelineError::Model(
                "logistic regression returned no prediction".into(),
            )),
        }
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
            [0.9, 1.0],
            [1.0, 0.9],
            [0.95, 0.95]
        ];
        let y = labels(&["water", "water", "water", "call_nurse", "call_nurse", "call_nurse"]);
        let mut model = Logistic::new(0.0);
        model.fit(x.view(), &y).unwrap();
        assert_eq!(model.predict_one(array![0.0f32, 0.0].view()).unwrap(), "water");
        assert_eq!(model.predict_one(array![1.0f32, 1.0].view()).unwrap(), "call_nurse");
        assert!(model.predict_one(array![1.0f32, 1.0, 1.0].view()).is_err());
    }
    #[test]
    fn single_class_is_rejected() {
        let x = array![[0.0f32], [1.0]];
        let mut model = Logistic::new(0.0);
        assert!(model.fit(x.view(), &labels(&["help", "help"])).is_err());
    }
}
