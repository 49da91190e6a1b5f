//! Табличные данные для диагностических графиков

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub column: String,
    /// Границы бинов, на одну больше чем counts
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Гистограммы всех числовых колонок (EDA)
pub fn feature_histograms(data: &Dataset, max_bins: usize) -> Vec<Histogram> {
    data.columns
        .iter()
        .filter(|name| data.is_numeric(name))
        .filter_map(|name| {
            let values: Vec<f64> = data.numeric_column(name).ok()?.into_iter().flatten().collect();
            Some(histogram(name, &values, max_bins))
        })
        .collect()
}

fn histogram(column: &str, values: &[f64], max_bins: usize) -> Histogram {
    if values.is_empty() || max_bins == 0 {
        return Histogram {
            column: column.to_string(),
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Для целых значений не дробим сильнее, чем шаг 1
    let distinct: BTreeSet<u64> = values.iter().map(|v| v.to_bits()).collect();
    let bins = max_bins.min(distinct.len()).max(1);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram {
        column: column.to_string(),
        edges,
        counts,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<usize>,
    /// counts[i][j]: фактический класс labels[i], предсказанный labels[j]
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCell {
    pub actual: String,
    pub predicted: String,
    pub count: usize,
}

impl ConfusionMatrix {
    pub fn new(actual: &[usize], predicted: &[usize]) -> Self {
        let labels: Vec<usize> = actual
            .iter()
            .chain(predicted)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (a, p) in actual.iter().zip(predicted) {
            if let (Ok(i), Ok(j)) = (labels.binary_search(a), labels.binary_search(p)) {
                counts[i][j] += 1;
            }
        }

        Self { labels, counts }
    }

    /// Длинный формат для графика: одна ячейка на пару классов
    pub fn to_long(&self) -> Vec<ConfusionCell> {
        let mut cells = Vec::with_capacity(self.labels.len() * self.labels.len());
        for (i, actual) in self.labels.iter().enumerate() {
            for (j, predicted) in self.labels.iter().enumerate() {
                cells.push(ConfusionCell {
                    actual: format!("Actual {}", actual),
                    predicted: format!("Predicted {}", predicted),
                    count: self.counts[i][j],
                });
            }
        }
        cells
    }
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let h = histogram("alcohol", &values, 40);
        assert_eq!(h.counts.len(), 40);
        assert_eq!(h.edges.len(), 41);
        assert_eq!(h.counts.iter().sum::<usize>(), 100);
    }

    #[test]
    fn few_distinct_values_use_few_bins() {
        let h = histogram("quality", &[5.0, 6.0, 6.0, 7.0], 40);
        assert_eq!(h.counts, vec![1, 2, 1]);
    }

    #[test]
    fn histograms_skip_text_columns() {
        let data = Dataset::new(
            vec!["colour".into(), "alcohol".into()],
            vec![vec![Value::Text("red".into()), Value::Float(9.5)]],
        )
        .unwrap();
        let hs = feature_histograms(&data, 40);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].column, "alcohol");
    }

    #[test]
    fn confusion_uses_union_of_labels() {
        let cm = ConfusionMatrix::new(&[5, 6, 6], &[5, 7, 6]);
        assert_eq!(cm.labels, vec![5, 6, 7]);
        assert_eq!(cm.counts, vec![vec![1, 0, 0], vec![0, 1, 1], vec![0, 0, 0]]);

        let long = cm.to_long();
        assert_eq!(long.len(), 9);
        assert_eq!(long[5].actual, "Actual 6");
        assert_eq!(long[5].predicted, "Predicted 7");
        assert_eq!(long[5].count, 1);
    }
}
