use std::collections::BTreeMap;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use crate::classifier::{check_query, check_training_input, Classifier};
use crate::drivers::PipelineError;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    Uniform,
    Distance,
}
/// k-nearest-neighbour vote over stored training vectors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnnClassifier {
    k: usize,
    weighting: Weighting,
    train: Array2<f32>,
    labels: Vec<String>,
}
impl KnnClassifier {
    pub fn new(k: usize, weighting: Weighting) -> Self {
        Self {
            k: k.max(1),
            weighting,
            train: Array2::zeros((0, 0)),
            labels: Vec::new(),
        }
    }
    pub fn k(&self) -> usize {
        self.k
    }
    /// (distance, label index) pairs of the nearest stored rows, closest first.
    fn neighbours(&self, query: ArrayView1<f32>) -> Vec<(f32, usize)> {
        let mut dists: Vec<(f32, usize)> = self
            .train
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (euclidean_distance(row, query), i))
            .collect();
        dists.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        dists.truncate(self.k.min(dists.len()));
        dists
    }
}
fn euclidean_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
impl Classifier for KnnClassifier {
    fn name(&self) -> String {
        match self.weighting {
            Weighting::Uniform => format!("kNN (k={})", self.k),
            Weighting::Distance => format!("kNN (k={}, distance-weighted)", self.k),
        }
    }
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError> {
        check_training_input(features, labels)?;
        self.train = features.to_owned();
        self.labels = labels.to_vec();
        Ok(())
    }
    fn input_dim(&self) -> usize {
        self.train.ncols()
    }
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError> {
        if self.labels.is_empty() {
            return Err(PipelineError::Model("kNN classifier has not been fitted".into()));
        }
        check_query(features, self.input_dim())?;
        let mut votes: BTreeMap<&str, (f32, f32)> = BTreeMap::new();
        for (dist, idx) in self.neighbours(features) {
            let weight = match self.weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance => 1.0 / (dist + 1e-6),
            };
            let entry = votes.entry(self.labels[idx].as_str()).or_insert((0.0, 0.0));
            entry.0 += weight;
            entry.1 += dist;
        }
        // ties go to the class whose neighbours are closer in total, then label order
        votes
            .into_iter()
            .max_by(|(la, a), (lb, b)| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
                    .then(lb.cmp(la))
            })
            .map(|(label, _)| label.to_string())
            .ok_or_else(|| PipelineError::Model("no neighbours found".into()))
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
    fn majority_vote_picks_closest_cluster() {
        let x = array![[0.0f32, 0.0], [0.1, 0.0], [0.0, 0.1], [5.0, 5.0], [5.1, 5.0]];
        let y = labels(&["help", "help", "help", "pain", "pain"]);
        let mut knn = KnnClassifier::new(5, Weighting::Uniform);
        knn.fit(x.view(), &y).unwrap();
        assert_eq!(knn.predict_one(array![0.05f32, 0.05].view()).unwrap(), "help");
        assert_eq!(knn.predict_one(array![4.9f32, 5.2].view()).unwrap(), "help");
        let mut weighted = KnnClassifier::new(5, Weighting::Distance);
        weighted.fit(x.view(), &y).unwrap();
        assert_eq!(weighted.predict_one(array![4.9f32, 5.2].view()).unwrap(), "pain");
    }
    #[test]
    fn k_larger_than_training_set_is_clamped() {
        let x = array![[0.0f32], [1.0]];
        let mut knn = KnnClassifier::new(25, Weighting::Uniform);
        knn.fit(x.view(), &labels(&["a", "b"])).unwrap();
        // one vote each, "a" is closer
        assert_eq!(knn.predict_one(array![0.2f32].view()).unwrap(), "a");
        assert_eq!(knn.predict_one(array![0.9f32].view()).unwrap(), "b");
    }
    #[test]
    fn query_of_other_width_is_rejected() {
        let x = array![[0.0f32, 0.0], [1.0, 1.0]];
        let mut knn = KnnClassifier::new(1, Weighting::Uniform);
        knn.fit(x.view(), &labels(&["a", "b"])).unwrap();
        assert!(matches!(
            knn.predict_one(array![0.0f32].view()),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(knn.predict_one(array![0.0f32, 0.0, 9.0].view()).is_err());
    }
    #[test]
    fn unfitted_model_errors() {
        let knn = KnnClassifier::new(1, Weighting::Uniform);
        assert!(knn.predict_one(array![0.0f32].view()).is_err());
    }
}
