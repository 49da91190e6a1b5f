//! Обучение дерева решений с перебором гиперпараметров

use std::path::Path;

use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_tree::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{FeatureSampling, ParamGrid, TrainingConfig};
use crate::error::{PipelineError, Result};
use crate::preprocessing::FeatureEngineer;
use crate::types::Dataset;

type TreeDataset = DatasetBase<Array2<f64>, Array1<usize>>;

/// Один набор гиперпараметров из сетки
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: FeatureSampling,
}

impl ParamGrid {
    /// Все комбинации; порядок ключей алфавитный, последний меняется быстрее всех
    pub fn candidates(&self) -> Vec<TreeParams> {
        let mut out = Vec::new();
        for &max_depth in &self.max_depth {
            for &max_features in &self.max_features {
                for &min_samples_leaf in &self.min_samples_leaf {
                    for &min_samples_split in &self.min_samples_split {
                        out.push(TreeParams {
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                            max_features,
                        });
                    }
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub tree: DecisionTree<f64, usize>,
    pub target: String,
    pub feature_names: Vec<String>,
    /// Индексы признаков, которые видело дерево
    pub used_features: Vec<usize>,
    pub params: TreeParams,
    pub cv_accuracy: f64,
}

impl TrainedModel {
    pub fn predict_matrix(&self, features: &Array2<f64>) -> Array1<usize> {
        let selected = features.select(Axis(1), &self.used_features);
        self.tree.predict(&selected)
    }

    pub fn predict(&self, data: &Dataset) -> Result<Array1<usize>> {
        let (features, _, names) = FeatureEngineer::extract_features(data, &self.target)?;
        if names != self.feature_names {
            return Err(PipelineError::InputDomain(format!(
                "model expects features {:?}, got {:?}",
                self.feature_names, names
            )));
        }
        Ok(self.predict_matrix(&features))
    }

    /// Важность признаков по убыванию; неиспользованные признаки получают 0
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        let mut importances = vec![0.0; self.feature_names.len()];
        for (&col, value) in self.used_features.iter().zip(self.tree.feature_importance()) {
            importances[col] = value;
        }

        let mut out: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(importances)
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();
        out.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        tracing::info!("Model saved to '{}'", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub struct ModelTrainer;

impl ModelTrainer {
    /// Перебор сетки с k-fold кросс-валидацией по accuracy,
    /// лучший кандидат переобучается на всех строках
    pub fn train(data: &Dataset, config: &TrainingConfig) -> Result<TrainedModel> {
        let (features, targets, feature_names) =
            FeatureEngineer::extract_features(data, &config.target)?;

        let n_samples = features.nrows();
        if feature_names.is_empty() {
            return Err(PipelineError::Training("no numeric features".to_string()));
        }
        if config.cv_folds < 2 || config.cv_folds > n_samples {
            return Err(PipelineError::InputDomain(format!(
                "cannot run {}-fold cross-validation on {} rows",
                config.cv_folds, n_samples
            )));
        }

        let candidates = config.grid.candidates();
        if candidates.is_empty() {
            return Err(PipelineError::InputDomain("empty parameter grid".to_string()));
        }
        tracing::info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            config.cv_folds,
            candidates.len(),
            config.cv_folds * candidates.len()
        );

        let mut best: Option<(TreeParams, f64)> = None;
        for params in candidates {
            let used = select_features(params.max_features, feature_names.len(), config.seed);
            let score = cross_val_accuracy(&features, &targets, &used, &params, config.cv_folds)?;
            tracing::debug!("{:?} -> {:.4}", params, score);

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((params, score));
            }
        }

        let (params, cv_accuracy) =
            best.ok_or_else(|| PipelineError::Training("no candidate scored".to_string()))?;
        let used_features = select_features(params.max_features, feature_names.len(), config.seed);
        let tree = fit_tree(&params, features.select(Axis(1), &used_features), targets)?;

        tracing::info!("Best params {:?} with CV accuracy {:.4}", params, cv_accuracy);

        Ok(TrainedModel {
            tree,
            target: config.target.clone(),
            feature_names,
            used_features,
            params,
            cv_accuracy,
        })
    }
}

/// Подмножество признаков для дерева; фиксировано сидом
fn select_features(sampling: FeatureSampling, n_features: usize, seed: u64) -> Vec<usize> {
    let k = sampling.feature_count(n_features);
    if k >= n_features {
        return (0..n_features).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, n_features, k).into_vec();
    picked.sort_unstable();
    picked
}

/// Границы фолдов: первые n % k фолдов на одну строку длиннее
fn fold_bounds(n: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let bounds = (start, start + len);
            start += len;
            bounds
        })
        .collect()
}

fn cross_val_accuracy(
    features: &Array2<f64>,
    targets: &Array1<usize>,
    used: &[usize],
    params: &TreeParams,
    folds: usize,
) -> Result<f64> {
    let x = features.select(Axis(1), used);
    let n = x.nrows();
    let mut total = 0.0;

    for (start, end) in fold_bounds(n, folds) {
        let train_idx: Vec<usize> = (0..start).chain(end..n).collect();
        let valid_idx: Vec<usize> = (start..end).collect();

        let tree = fit_tree(
            params,
            x.select(Axis(0), &train_idx),
            targets.select(Axis(0), &train_idx),
        )?;
        let predicted = tree.predict(&x.select(Axis(0), &valid_idx));
        let actual = targets.select(Axis(0), &valid_idx);

        let correct = predicted.iter().zip(actual.iter()).filter(|(p, a)| p == a).count();
        total += correct as f64 / valid_idx.len() as f64;
    }

    Ok(total / folds as f64)
}

fn fit_tree(
    params: &TreeParams,
    records: Array2<f64>,
    targets: Array1<usize>,
) -> Result<DecisionTree<f64, usize>> {
    let tree_params = DecisionTree::<f64, usize>::params()
        .split_quality(SplitQuality::Gini)
        .max_depth(params.max_depth)
        .min_weight_split(params.min_samples_split as f32)
        .min_weight_leaf(params.min_samples_leaf as f32);

    let dataset: TreeDataset = DatasetBase::new(records, targets);
    tree_params
        .fit(&dataset)
        .map_err(|e: linfa::Error| PipelineError::Training(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    /// Класс полностью определяется признаком `signal`
    fn separable(n: usize) -> Dataset {
        let rows = (0..n)
            .map(|i| {
                let class = 5 + (i % 2) as i64;
                vec![
                    Value::Float(class as f64 * 10.0 + (i % 3) as f64),
                    Value::Float(((i * 7) % 11) as f64),
                    Value::Int(class),
                ]
            })
            .collect();
        Dataset::new(vec!["signal".into(), "noise".into(), "quality".into()], rows).unwrap()
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            grid: ParamGrid {
                max_depth: vec![Some(1), Some(3)],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
                max_features: vec![FeatureSampling::All],
            },
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn default_grid_has_all_combinations() {
        let candidates = ParamGrid::default().candidates();
        assert_eq!(candidates.len(), 4 * 3 * 3 * 3);
        assert_eq!(candidates[0].max_depth, Some(3));
        assert_eq!(candidates[0].min_samples_split, 2);
        assert_eq!(candidates[1].min_samples_split, 5);
    }

    #[test]
    fn fold_bounds_cover_all_rows() {
        let bounds = fold_bounds(12, 5);
        assert_eq!(bounds, vec![(0, 3), (3, 6), (6, 8), (8, 10), (10, 12)]);
    }

    #[test]
    fn feature_subset_is_deterministic() {
        let a = select_features(FeatureSampling::Sqrt, 11, 16);
        let b = select_features(FeatureSampling::Sqrt, 11, 16);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(select_features(FeatureSampling::All, 4, 16), vec![0, 1, 2, 3]);
    }

    #[test]
    fn learns_separable_classes() {
        let data = separable(40);
        let model = ModelTrainer::train(&data, &small_config()).unwrap();

        assert!(model.cv_accuracy > 0.99);
        let predicted = model.predict(&data).unwrap();
        let (_, actual, _) = FeatureEngineer::extract_features(&data, "quality").unwrap();
        assert_eq!(predicted, actual);

        let importances = model.feature_importances();
        assert_eq!(importances[0].feature, "signal");
        assert_eq!(importances.len(), 2);
    }

    #[test]
    fn model_survives_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("model/model.json");
        let data = separable(20);

        let model = ModelTrainer::train(&data, &small_config()).unwrap();
        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.params, model.params);
        assert_eq!(loaded.predict(&data).unwrap(), model.predict(&data).unwrap());
    }

    #[test]
    fn too_many_folds_is_input_error() {
        let config = TrainingConfig { cv_folds: 50, ..small_config() };
        let err = ModelTrainer::train(&separable(10), &config).unwrap_err();
        assert!(matches!(err, PipelineError::InputDomain(_)));
    }
}
