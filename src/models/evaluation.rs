//! Метрики качества классификатора на тестовой выборке

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Строки по классам, затем "macro avg" и "weighted avg"
    pub rows: Vec<ReportRow>,
    pub accuracy: f64,
}

pub fn accuracy(actual: &[usize], predicted: &[usize]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    correct as f64 / actual.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    pub fn new(actual: &[usize], predicted: &[usize]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(PipelineError::InputDomain(format!(
                "{} labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }

        let labels: BTreeSet<usize> = actual.iter().chain(predicted).copied().collect();
        let mut rows = Vec::with_capacity(labels.len() + 2);

        for &label in &labels {
            let tp = actual
                .iter()
                .zip(predicted)
                .filter(|(a, p)| **a == label && **p == label)
                .count();
            let predicted_count = predicted.iter().filter(|p| **p == label).count();
            let support = actual.iter().filter(|a| **a == label).count();

            let precision = ratio(tp, predicted_count);
            let recall = ratio(tp, support);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            rows.push(ReportRow {
                label: label.to_string(),
                precision,
                recall,
                f1_score,
                support,
            });
        }

        let n_classes = rows.len().max(1) as f64;
        let total: usize = rows.iter().map(|r| r.support).sum();
        let macro_avg = ReportRow {
            label: "macro avg".to_string(),
            precision: rows.iter().map(|r| r.precision).sum::<f64>() / n_classes,
            recall: rows.iter().map(|r| r.recall).sum::<f64>() / n_classes,
            f1_score: rows.iter().map(|r| r.f1_score).sum::<f64>() / n_classes,
            support: total,
        };
        let weighted = |f: fn(&ReportRow) -> f64| {
            rows.iter().map(|r| f(r) * r.support as f64).sum::<f64>() / total.max(1) as f64
        };
        let weighted_avg = ReportRow {
            label: "weighted avg".to_string(),
            precision: weighted(|r| r.precision),
            recall: weighted(|r| r.recall),
            f1_score: weighted(|r| r.f1_score),
            support: total,
        };

        rows.push(macro_avg);
        rows.push(weighted_avg);

        Ok(Self {
            rows,
            accuracy: accuracy(actual, predicted),
        })
    }

    pub fn row(&self, label: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["label", "precision", "recall", "f1-score", "support"])?;
        for row in &self.rows {
            writer.write_record([
                row.label.clone(),
                row.precision.to_string(),
                row.recall.to_string(),
                row.f1_score.to_string(),
                row.support.to_string(),
            ])?;
        }
        writer.write_record([
            "accuracy".to_string(),
            self.accuracy.to_string(),
            self.accuracy.to_string(),
            self.accuracy.to_string(),
            self.rows.last().map_or(0, |r| r.support).to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
