use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use crate::drivers::PipelineError;
/// Sorted label set; smartcore estimators train on the integer positions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIndex {
    classes: Vec<String>,
}
impl ClassIndex {
    /// Returns the index together with one code per label.
    pub fn encode(labels: &[String]) -> (Self, Vec<i32>) {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        let codes = labels
            .iter()
            .map(|label| classes.binary_search(label).map_or(-1, |i| i as i32))
            .collect();
        (Self { classes }, codes)
    }
    pub fn decode(&self, code: i32) -> Result<String, PipelineError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .cloned()
            .ok_or_else(|| PipelineError::UnknownLabel(code.to_string()))
    }
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
pub(crate) fn to_dense(features: ArrayView2<f32>) -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = features
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| f64::from(*v)).collect())
        .collect();
    DenseMatrix::from_2d_vec(&rows)
}
pub(crate) fn row_to_dense(features: ArrayView1<f32>) -> DenseMatrix<f64> {
    DenseMatrix::from_2d_vec(&vec![features.iter().map(|v| f64::from(*v)).collect()])
}
pub(crate) fn backend_error(err: Failed) -> PipelineError {
    PipelineError::Model(err.to_string())
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn codes_follow_sorted_labels() {
        let labels: Vec<String> = ["water", "help", "water", "pain"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (index, codes) = ClassIndex::encode(&labels);
        assert_eq!(index.classes(), &["help", "pain", "water"]);
        assert_eq!(codes, vec![2, 0, 2, 1]);
        assert_eq!(index.decode(1).unwrap(), "pain");
        assert!(matches!(index.decode(3), Err(PipelineError::UnknownLabel(_))));
        assert!(index.decode(-1).is_err());
    }
}
