//! Проверки уровня датасета
//!
//! Каждая проверка это отдельный именованный предикат. Все проверки
//! выполняются независимо, провал одной не отменяет остальные.

use std::collections::{BTreeMap, HashSet};

use crate::preprocessing::FeatureEngineer;
use crate::types::Dataset;

/// Результат одной проверки: Ok или текст нарушения
pub type CheckOutcome = Result<(), String>;

pub trait DatasetCheck: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, data: &Dataset) -> CheckOutcome;
}

pub struct NoDuplicateRows;

impl DatasetCheck for NoDuplicateRows {
    fn name(&self) -> &str {
        "no_duplicate_rows"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        let mut seen = HashSet::with_capacity(data.len());
        let duplicates = data.rows.iter().filter(|row| !seen.insert(*row)).count();
        if duplicates == 0 {
            Ok(())
        } else {
            Err(format!("Duplicate rows found ({}).", duplicates))
        }
    }
}

pub struct NoEmptyRows;

impl DatasetCheck for NoEmptyRows {
    fn name(&self) -> &str {
        "no_empty_rows"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        let empty = data
            .rows
            .iter()
            .filter(|row| row.iter().all(|v| v.is_null()))
            .count();
        if empty == 0 {
            Ok(())
        } else {
            Err(format!("Empty rows found ({}).", empty))
        }
    }
}

/// Доля пропусков в каждой колонке строго меньше `limit`
pub struct MissingnessBelow {
    pub limit: f64,
}

impl DatasetCheck for MissingnessBelow {
    fn name(&self) -> &str {
        "missingness_below_threshold"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        if data.is_empty() {
            return Ok(());
        }

        let n = data.len() as f64;
        let offenders: Vec<String> = data
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let missing = data.rows.iter().filter(|row| row[i].is_null()).count() as f64;
                let ratio = missing / n;
                (ratio >= self.limit).then(|| format!("{} ({:.3})", name, ratio))
            })
            .collect();

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Missingness exceeds threshold {}: {}.",
                self.limit,
                offenders.join(", ")
            ))
        }
    }
}

/// Доля каждого класса целевой переменной в [min, max]
pub struct ClassBalanceWithin {
    pub target: String,
    pub min: f64,
    pub max: f64,
}

impl DatasetCheck for ClassBalanceWithin {
    fn name(&self) -> &str {
        "target_distribution"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        let values = data
            .column(&self.target)
            .map_err(|_| format!("Target column '{}' not found.", self.target))?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0usize;
        for value in values.filter(|v| !v.is_null()) {
            *counts.entry(format!("{:?}", value)).or_default() += 1;
            total += 1;
        }

        let offenders: Vec<String> = counts
            .iter()
            .map(|(class, count)| (class, *count as f64 / total as f64))
            // Границы включительные: доля ровно 0.5 допустима
            .filter(|(_, share)| *share < self.min || *share > self.max)
            .map(|(class, share)| format!("{} ({:.4})", class, share))
            .collect();

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Quality distribution is outside expected bounds: {}.",
                offenders.join(", ")
            ))
        }
    }
}

/// |corr(feature, target)| < limit для каждого признака
pub struct TargetCorrelationBelow {
    pub target: String,
    pub limit: f64,
}

impl DatasetCheck for TargetCorrelationBelow {
    fn name(&self) -> &str {
        "target_feature_correlation"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        let target = data
            .numeric_column(&self.target)
            .map_err(|_| format!("Target column '{}' not found.", self.target))?;

        let mut offenders = Vec::new();
        for name in data.feature_names(&self.target) {
            let feature = data.numeric_column(&name).map_err(|e| e.to_string())?;
            if let Some(r) = FeatureEngineer::pearson(&feature, &target) {
                if r.abs() >= self.limit {
                    offenders.push(format!("{} ({:.3})", name, r));
                }
            }
        }

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Anomalous correlations found between {} and features: {}.",
                self.target,
                offenders.join(", ")
            ))
        }
    }
}

/// |corr(a, b)| < limit для каждой пары разных признаков
pub struct FeatureCorrelationBelow {
    pub target: String,
    pub limit: f64,
}

impl DatasetCheck for FeatureCorrelationBelow {
    fn name(&self) -> &str {
        "feature_feature_correlation"
    }

    fn evaluate(&self, data: &Dataset) -> CheckOutcome {
        let names = data.feature_names(&self.target);
        let columns = names
            .iter()
            .map(|name| data.numeric_column(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let mut offenders = Vec::new();
        for i in 0..columns.len() {
            for j in (i + 1)..columns.len() {
                if let Some(r) = FeatureEngineer::pearson(&columns[i], &columns[j]) {
                    if r.abs() >= self.limit {
                        offenders.push(format!("{}~{} ({:.3})", names[i], names[j], r));
                    }
                }
            }
        }

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Anomalous correlations found between features: {}.",
                offenders.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn frame(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        Dataset::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn duplicates_and_empty_rows() {
        let data = frame(
            &["a", "b"],
            vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Null, Value::Null],
            ],
        );
        assert!(NoDuplicateRows.evaluate(&data).is_err());
        assert!(NoEmptyRows.evaluate(&data).is_err());
        assert!(NoDuplicateRows.evaluate(&frame(&["a"], vec![vec![Value::Int(1)]])).is_ok());
    }

    #[test]
    fn missingness_is_strictly_below_limit() {
        // 1 пропуск из 20 = 0.05, это уже нарушение
        let mut rows: Vec<Vec<Value>> = (0..19).map(|i| vec![Value::Int(i)]).collect();
        rows.push(vec![Value::Null]);
        let check = MissingnessBelow { limit: 0.05 };
        let err = check.evaluate(&frame(&["a"], rows.clone())).unwrap_err();
        assert!(err.contains('a'));

        rows.push(vec![Value::Int(99)]);
        assert!(check.evaluate(&frame(&["a"], rows)).is_ok());
    }

    #[test]
    fn dominant_class_fails_balance() {
        let check = ClassBalanceWithin { target: "quality".into(), min: 0.0001, max: 0.5 };

        let even = frame(&["quality"], (0..10).map(|i| vec![Value::Int(5 + i % 2)]).collect());
        assert!(check.evaluate(&even).is_ok());

        let skewed = frame(
            &["quality"],
            (0..10).map(|i| vec![Value::Int(if i < 7 { 5 } else { 6 })]).collect(),
        );
        assert!(check.evaluate(&skewed).is_err());
    }

    #[test]
    fn class_share_on_bound_passes() {
        let check = ClassBalanceWithin { target: "quality".into(), min: 0.0001, max: 0.5 };

        // 4 из 8 = ровно 0.5
        let on_bound = frame(
            &["quality"],
            (0..8).map(|i| vec![Value::Int(if i < 4 { 5 } else { 6 + i % 2 })]).collect(),
        );
        assert!(check.evaluate(&on_bound).is_ok());

        // 5 из 9 уже больше 0.5
        let over = frame(
            &["quality"],
            (0..9).map(|i| vec![Value::Int(if i < 5 { 5 } else { 6 + i % 2 })]).collect(),
        );
        let err = check.evaluate(&over).unwrap_err();
        assert!(err.contains("Int(5)"));
    }

    #[test]
    fn leaking_feature_is_flagged() {
        let rows = (0..10)
            .map(|i| vec![Value::Float(i as f64 * 2.0), Value::Float((i * 7 % 5) as f64), Value::Int(i)])
            .collect();
        let data = frame(&["leak", "noise", "quality"], rows);

        let err = TargetCorrelationBelow { target: "quality".into(), limit: 0.9 }
            .evaluate(&data)
            .unwrap_err();
        assert!(err.contains("leak"));
        assert!(!err.contains("noise"));
    }

    #[test]
    fn collinear_features_are_flagged() {
        let rows = (0..10)
            .map(|i| {
                vec![
                    Value::Float(i as f64),
                    Value::Float(i as f64 * 3.0 + 1.0),
                    Value::Int(3 + i % 3),
                ]
            })
            .collect();
        let data = frame(&["a", "b", "quality"], rows);

        let err = FeatureCorrelationBelow { target: "quality".into(), limit: 0.9 }
            .evaluate(&data)
            .unwrap_err();
        assert!(err.contains("a~b"));
    }

    #[test]
    fn constant_feature_does_not_fail_correlation() {
        let rows = (0..5).map(|i| vec![Value::Float(1.0), Value::Int(i)]).collect();
        let data = frame(&["flat", "quality"], rows);
        assert!(TargetCorrelationBelow { target: "quality".into(), limit: 0.9 }
            .evaluate(&data)
            .is_ok());
    }
}
