//! Проверка дрейфа распределений между train и test

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DriftConfig;
use crate::error::{PipelineError, Result};
use crate::report;
use crate::types::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub scores: BTreeMap<String, f64>,
    pub threshold: f64,
    pub passed: bool,
    pub generated_at: DateTime<Utc>,
}

impl DriftReport {
    pub fn drifted_features(&self) -> Vec<String> {
        self.scores
            .iter()
            .filter(|(_, score)| **score >= self.threshold)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

pub struct DriftChecker;

impl DriftChecker {
    /// Оценки дрейфа по каждому числовому признаку, без записи отчёта
    pub fn score(train: &Dataset, test: &Dataset, config: &DriftConfig) -> Result<DriftReport> {
        let mut names = train.feature_names(&config.target);
        if config.include_target {
            if train.column_index(&config.target).is_none() {
                return Err(PipelineError::MissingColumn(config.target.clone()));
            }
            names.push(config.target.clone());
        }

        let mut scores = BTreeMap::new();
        for name in names {
            let reference: Vec<f64> = train.numeric_column(&name)?.into_iter().flatten().collect();
            let current: Vec<f64> = test.numeric_column(&name)?.into_iter().flatten().collect();
            let score = match (reference.is_empty(), current.is_empty()) {
                (false, false) | (true, true) => earth_movers_distance(&reference, &current),
                // Признак пропал с одной стороны: это максимальный дрейф
                _ => {
                    tracing::warn!(
                        "Feature '{}' has {} numeric values in train and {} in test",
                        name,
                        reference.len(),
                        current.len()
                    );
                    1.0
                }
            };
            scores.insert(name, score);
        }

        let passed = scores.values().all(|s| *s < config.threshold);
        Ok(DriftReport {
            scores,
            threshold: config.threshold,
            passed,
            generated_at: Utc::now(),
        })
    }

    /// Считает дрейф, всегда пишет HTML-отчёт, затем сообщает о дрейфе ошибкой
    pub fn check(train: &Dataset, test: &Dataset, config: &DriftConfig) -> Result<DriftReport> {
        let report = Self::score(train, test, config)?;
        report::write_drift_report(&report, &config.report_path)?;

        if report.passed {
            tracing::info!(
                "No drift: {} feature(s) below threshold {}",
                report.scores.len(),
                report.threshold
            );
            Ok(report)
        } else {
            tracing::warn!("Drift detected in: {}", report.drifted_features().join(", "));
            Err(PipelineError::DriftDetected(Box::new(report)))
        }
    }
}

/// Нормированное расстояние Вассерштейна-1 между двумя выборками.
/// 0 для одинаковых распределений, не больше 1.
pub fn earth_movers_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let lo = a[0].min(b[0]);
    let hi = a[a.len() - 1].max(b[b.len() - 1]);
    let range = hi - lo;
    if range <= 0.0 {
        return 0.0;
    }

    let mut points: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    points.sort_by(f64::total_cmp);
    points.dedup();

    // Интеграл |F_a - F_b| по отрезкам между соседними точками
    let (mut i, mut j) = (0usize, 0usize);
    let mut distance = 0.0;
    for w in points.windows(2) {
        while i < a.len() && a[i] <= w[0] {
            i += 1;
        }
        while j < b.len() && b[j] <= w[0] {
            j += 1;
        }
        let cdf_a = i as f64 / a.len() as f64;
        let cdf_b = j as f64 / b.len() as f64;
        distance += (cdf_a - cdf_b).abs() * (w[1] - w[0]);
    }

    distance / range
}
