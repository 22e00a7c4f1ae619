//! Fit/evaluate loop and cross-validated grid search over model specs.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::classifier::{ModelSpec, TrainedModel, Weighting};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::drivers::PipelineError;

/// Seed for fold shuffling, so grid searches are repeatable.
pub const CV_SEED: u64 = 42;

#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Clone, Debug)]
pub struct EvaluationReport {
    pub model_name: String,
    pub accuracy: f64,
    /// Sorted union of true and predicted labels; indexes the confusion matrix.
    pub classes: Vec<String>,
    /// Rows are actual labels, columns are predictions.
    pub confusion: Array2<usize>,
    pub per_class: Vec<ClassMetrics>,
    pub fit_time: Duration,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Accuracy: {:.3}%", self.model_name, self.accuracy * 100.0)?;
        writeln!(
            f,
            "{:>20} {:>10} {:>10} {:>10} {:>8}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>20} {:>10.2} {:>10.2} {:>10.2} {:>8}",
                m.label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f, "confusion (rows = actual, cols = predicted):")?;
        for (label, row) in self.classes.iter().zip(self.confusion.rows()) {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>4}")).collect();
            writeln!(f, "{:>20} {}", label, cells.join(""))?;
        }
        Ok(())
    }
}

pub fn accuracy(actual: &[String], predicted: &[String]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    hits as f64 / actual.len() as f64
}

/// Confusion matrix over the sorted union of labels seen in either vector.
pub fn confusion_matrix(actual: &[String], predicted: &[String]) -> (Vec<String>, Array2<usize>) {
    let mut classes: Vec<String> = actual.iter().chain(predicted).cloned().collect();
    classes.sort();
    classes.dedup();
    let mut matrix = Array2::<usize>::zeros((classes.len(), classes.len()));
    for (a, p) in actual.iter().zip(predicted) {
        if let (Ok(i), Ok(j)) = (classes.binary_search(a), classes.binary_search(p)) {
            matrix[[i, j]] += 1;
        }
    }
    (classes, matrix)
}

fn class_metrics(classes: &[String], confusion: &Array2<usize>) -> Vec<ClassMetrics> {
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    classes
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let tp = confusion[[i, i]];
            let support = confusion.row(i).sum();
            let predicted = confusion.column(i).sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect()
}

/// Fits `spec` on `train`, scores it on `test`, and returns the fitted model.
pub fn evaluate(
    spec: &ModelSpec,
    train: &Dataset,
    test: &Dataset,
    config: &PipelineConfig,
) -> Result<(TrainedModel, EvaluationReport), PipelineError> {
    let started = Instant::now();
    let model = TrainedModel::train(spec, train, config)?;
    let fit_time = started.elapsed();
    let report = score(&model, test)?;
    info!(
        "{} completed in {:.2} seconds",
        report.model_name,
        fit_time.as_secs_f64()
    );
    Ok((
        model,
        EvaluationReport {
            fit_time,
            ..report
        },
    ))
}

/// Scores an already trained model on a held-out dataset.
pub fn score(model: &TrainedModel, test: &Dataset) -> Result<EvaluationReport, PipelineError> {
    if test.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let started = Instant::now();
    let predicted = model.predict_batch(test.features.view())?;
    let (classes, confusion) = confusion_matrix(&test.labels, &predicted);
    let per_class = class_metrics(&classes, &confusion);
    Ok(EvaluationReport {
        model_name: model.name(),
        accuracy: accuracy(&test.labels, &predicted),
        classes,
        confusion,
        per_class,
        fit_time: started.elapsed(),
    })
}

/// kNN candidates for every `k`, both weightings.
pub fn knn_grid(ks: &[usize]) -> Vec<ModelSpec> {
    ks.iter()
        .flat_map(|&k| {
            [Weighting::Uniform, Weighting::Distance]
                .into_iter()
                .map(move |weighting| ModelSpec::Knn { k, weighting })
        })
        .collect()
}

/// Random forest candidates for every tree count and depth limit.
pub fn forest_grid(trees: &[u16], depths: &[Option<u16>]) -> Vec<ModelSpec> {
    trees
        .iter()
        .flat_map(|&trees| {
            depths
                .iter()
                .map(move |&max_depth| ModelSpec::RandomForest { trees, max_depth })
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct GridSearchResult {
    pub best: ModelSpec,
    pub best_score: f64,
    /// Mean cross-validated accuracy per candidate, in grid order.
    pub scores: Vec<(ModelSpec, f64)>,
}

/// Shuffled k-fold split of `n` rows. Each entry is the held-out index set.
fn fold_indices(n: usize, folds: usize) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(CV_SEED));
    let mut out = vec![Vec::new(); folds];
    for (pos, idx) in order.into_iter().enumerate() {
        out[pos % folds].push(idx);
    }
    out
}

/// Cross-validates each candidate and returns the one with the best mean accuracy.
/// Earlier candidates win ties.
pub fn grid_search(
    candidates: &[ModelSpec],
    data: &Dataset,
    folds: usize,
    config: &PipelineConfig,
) -> Result<GridSearchResult, PipelineError> {
    if candidates.is_empty() {
        return Err(PipelineError::Model("grid search needs at least one candidate".into()));
    }
    if data.len() < 2 {
        return Err(PipelineError::EmptyDataset);
    }
    let folds = folds.clamp(2, data.len());
    let splits = fold_indices(data.len(), folds);
    let mut scores = Vec::with_capacity(candidates.len());
    for spec in candidates {
        let mut total = 0.0;
        for (fold, held_out) in splits.iter().enumerate() {
            let train_idx: Vec<usize> = (0..data.len()).filter(|i| !held_out.contains(i)).collect();
            let model = TrainedModel::train(spec, &data.subset(&train_idx), config)?;
            let report = score(&model, &data.subset(held_out))?;
            debug!("[CV {}/{}] {}: {:.3}", fold + 1, folds, spec, report.accuracy);
            total += report.accuracy;
        }
        let mean = total / folds as f64;
        info!("{spec}: mean CV accuracy {:.3}", mean);
        scores.push((spec.clone(), mean));
    }
    let (best, best_score) = scores
        .iter()
        .fold(None::<&(ModelSpec, f64)>, |best, cand| match best {
            Some(b) if b.1 >= cand.1 => Some(b),
            _ => Some(cand),
        })
        .cloned()
        .ok_or(PipelineError::EmptyDataset)?;
    info!("best parameters: {best} ({:.3})", best_score);
    Ok(GridSearchResult {
        best,
        best_score,
        scores,
    })
}
