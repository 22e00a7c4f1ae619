use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use crate::classifier::{check_query, check_training_input, Classifier};
use crate::drivers::PipelineError;
/// Assigns the label whose mean training vector is closest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NearestCentroid {
    centroids: Array2<f32>,
    classes: Vec<String>,
}
impl NearestCentroid {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
impl Classifier for NearestCentroid {
    fn name(&self) -> String {
        "Nearest centroid".to_string()
    }
    fn fit(&mut self, features: ArrayView2<f32>, labels: &[String]) -> Result<(), PipelineError> {
        check_training_input(features, labels)?;
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let mut centroids = Array2::<f32>::zeros((classes.len(), features.ncols()));
        for (class, mut centroid) in classes.iter().zip(centroids.axis_iter_mut(Axis(0))) {
            let rows: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == class)
                .map(|(i, _)| i)
                .collect();
            if let Some(mean) = features.select(Axis(0), &rows).mean_axis(Axis(0)) {
                centroid.assign(&mean);
            }
        }
        self.centroids = centroids;
        self.classes = classes;
        Ok(())
    }
    fn input_dim(&self) -> usize {
        self.centroids.ncols()
    }
    fn predict_one(&self, features: ArrayView1<f32>) -> Result<String, PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::Model("nearest centroid has not been fitted".into()));
        }
        check_query(features, self.input_dim())?;
        self.centroids
            .rows()
            .into_iter()
            .zip(&self.classes)
            .map(|(centroid, class)| {
                let dist: f32 = centroid
                    .iter()
                    .zip(features.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (dist, class)
            })
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, class)| class.clone())
            .ok_or_else(|| PipelineError::Model("nearest centroid has not been fitted".into()))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    #[test]
    fn centroids_are_class_means() {
        let x = array![[0.0f32, 0.0], [2.0, 2.0], [10.0, 10.0], [12.0, 8.0]];
        let y: Vec<String> = ["water", "water", "pain", "pain"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut model = NearestCentroid::new();
        model.fit(x.view(), &y).unwrap();
        assert_eq!(model.classes(), &["pain".to_string(), "water".to_string()]);
        assert_eq!(model.centroids.row(0).to_vec(), vec![11.0, 9.0]);
        assert_eq!(model.centroids.row(1).to_vec(), vec![1.0, 1.0]);
        assert_eq!(model.predict_one(array![3.0f32, 3.0].view()).unwrap(), "water");
        assert_eq!(model.predict_one(array![8.0f32, 9.0].view()).unwrap(), "pain");
        assert!(matches!(
            model.predict_one(array![8.0f32].view()),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
