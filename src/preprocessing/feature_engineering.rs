//! Подготовка признаков: матрица для моделей и корреляции

use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::types::{Dataset, Value};

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Матрица признаков (все числовые колонки кроме целевой) и метки
    pub fn extract_features(
        data: &Dataset,
        target: &str,
    ) -> Result<(Array2<f64>, Array1<usize>, Vec<String>)> {
        let target_idx = data
            .column_index(target)
            .ok_or_else(|| PipelineError::MissingColumn(target.to_string()))?;
        let feature_names = data.feature_names(target);
        let indices: Vec<usize> = feature_names
            .iter()
            .filter_map(|name| data.column_index(name))
            .collect();

        let mut features = Array2::zeros((data.len(), indices.len()));
        let mut targets = Array1::zeros(data.len());

        for (i, row) in data.rows.iter().enumerate() {
            for (j, &col) in indices.iter().enumerate() {
                features[[i, j]] = row[col].as_f64().ok_or_else(|| {
                    PipelineError::InputDomain(format!(
                        "row {} has no numeric value for '{}'",
                        i, data.columns[col]
                    ))
                })?;
            }

            targets[i] = match row[target_idx] {
                Value::Int(v) if v >= 0 => v as usize,
                ref other => {
                    return Err(PipelineError::InputDomain(format!(
                        "row {} has non-class target value {:?}",
                        i, other
                    )))
                }
            };
        }

        Ok((features, targets, feature_names))
    }

    /// Корреляция Пирсона по парам, где обе стороны не null.
    /// None, если дисперсия нулевая или пар меньше двух.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
        let pairs: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .collect();

        if pairs.len() < 2 {
            return None;
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (a, b) in &pairs {
            cov += (a - mean_x) * (b - mean_y);
            var_x += (a - mean_x).powi(2);
            var_y += (b - mean_y).powi(2);
        }

        if var_x < 1e-12 || var_y < 1e-12 {
            return None;
        }

        Some(cov / (var_x.sqrt() * var_y.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = some(&[1.0, 2.0, 3.0, 4.0]);
        let y = some(&[2.0, 4.0, 6.0, 8.0]);
        let z = some(&[4.0, 3.0, 2.0, 1.0]);
        assert!((FeatureEngineer::pearson(&x, &y).unwrap() - 1.0).abs() < 1e-9);
        assert!((FeatureEngineer::pearson(&x, &z).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_skips_nulls_and_constants() {
        let x = vec![Some(1.0), None, Some(3.0), Some(5.0)];
        let y = vec![Some(1.0), Some(100.0), Some(3.0), Some(5.0)];
        assert!((FeatureEngineer::pearson(&x, &y).unwrap() - 1.0).abs() < 1e-9);

        let flat = some(&[2.0, 2.0, 2.0, 2.0]);
        assert!(FeatureEngineer::pearson(&flat, &y).is_none());
    }

    #[test]
    fn extracts_matrix_without_target() {
        let data = Dataset::new(
            vec!["a".into(), "quality".into(), "b".into()],
            vec![
                vec![Value::Float(1.5), Value::Int(5), Value::Int(2)],
                vec![Value::Float(2.5), Value::Int(6), Value::Int(3)],
            ],
        )
        .unwrap();

        let (x, y, names) = FeatureEngineer::extract_features(&data, "quality").unwrap();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(x.dim(), (2, 2));
        assert_eq!(x[[1, 1]], 3.0);
        assert_eq!(y.to_vec(), vec![5, 6]);
    }

    #[test]
    fn null_feature_is_rejected() {
        let data = Dataset::new(
            vec!["a".into(), "quality".into()],
            vec![vec![Value::Null, Value::Int(5)]],
        )
        .unwrap();
        assert!(FeatureEngineer::extract_features(&data, "quality").is_err());
    }
}
