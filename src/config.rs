/// Конфигурация стадий пайплайна
///
/// Все пороги и пути передаются в стадии явно, глобальных констант нет.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const DEFAULT_TARGET: &str = "quality";
pub const DEFAULT_DATASET_ID: u32 = 186;
pub const RAW_FILE_NAME: &str = "wine_quality_combined.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Нарушения логируются, пайплайн продолжает работу
    #[default]
    Warn,
    /// Любое нарушение останавливает пайплайн
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub policy: ValidationPolicy,
    #[serde(default = "default_max_missing_ratio")]
    pub max_missing_ratio: f64,
    #[serde(default = "default_min_class_ratio")]
    pub min_class_ratio: f64,
    #[serde(default = "default_max_class_ratio")]
    pub max_class_ratio: f64,
    #[serde(default = "default_max_correlation")]
    pub max_correlation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Колонка для стратификации, при None простое случайное разбиение
    #[serde(default)]
    pub stratify_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_drift_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub include_target: bool,
    #[serde(default = "default_fail_on_drift")]
    pub fail_on_drift: bool,
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    #[serde(default = "default_training_seed")]
    pub seed: u64,
    #[serde(default)]
    pub grid: ParamGrid,
}

/// Сетка гиперпараметров дерева решений
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    #[serde(default = "default_max_depth")]
    pub max_depth: Vec<Option<usize>>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: Vec<usize>,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: Vec<usize>,
    #[serde(default = "default_max_features")]
    pub max_features: Vec<FeatureSampling>,
}

/// Сколько признаков видит дерево
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSampling {
    All,
    Sqrt,
    Log2,
}

impl FeatureSampling {
    pub fn feature_count(self, n_features: usize) -> usize {
        let n = match self {
            FeatureSampling::All => n_features,
            FeatureSampling::Sqrt => (n_features as f64).sqrt() as usize,
            FeatureSampling::Log2 => (n_features as f64).log2() as usize,
        };
        n.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
}

impl PathsConfig {
    pub fn raw_csv(&self) -> PathBuf {
        self.raw_dir.join(RAW_FILE_NAME)
    }

    pub fn train_csv(&self) -> PathBuf {
        self.processed_dir.join("wine_train.csv")
    }

    pub fn test_csv(&self) -> PathBuf {
        self.processed_dir.join("wine_test.csv")
    }

    pub fn feature_importance_csv(&self) -> PathBuf {
        self.processed_dir.join("feature_importance.csv")
    }

    pub fn classification_report_csv(&self) -> PathBuf {
        self.processed_dir.join("classification_report.csv")
    }

    pub fn model_json(&self) -> PathBuf {
        self.model_dir.join("model.json")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Общая целевая колонка; стадии обязаны на ней сходиться
    pub fn target(&self) -> Result<&str> {
        let target = self.validation.target.as_str();
        if self.drift.target != target || self.training.target != target {
            return Err(PipelineError::InputDomain(format!(
                "target column differs between stages: validation '{}', drift '{}', training '{}'",
                target, self.drift.target, self.training.target
            )));
        }
        Ok(target)
    }

    /// Все пути относительно заданного корня
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            paths: PathsConfig {
                raw_dir: root.join(default_raw_dir()),
                processed_dir: root.join(default_processed_dir()),
                model_dir: root.join(default_model_dir()),
                image_dir: root.join(default_image_dir()),
            },
            drift: DriftConfig {
                report_path: root.join(default_report_path()),
                ..DriftConfig::default()
            },
            ..Self::default()
        }
    }
}

fn default_target() -> String { DEFAULT_TARGET.to_string() }
fn default_max_missing_ratio() -> f64 { 0.05 }
fn default_min_class_ratio() -> f64 { 0.0001 }
fn default_max_class_ratio() -> f64 { 0.5 }
fn default_max_correlation() -> f64 { 0.9 }
fn default_test_fraction() -> f64 { 0.2 }
fn default_seed() -> u64 { 123 }
fn default_drift_threshold() -> f64 { 0.2 }
fn default_fail_on_drift() -> bool { true }
fn default_report_path() -> PathBuf { PathBuf::from("data/report/validation_report.html") }
fn default_cv_folds() -> usize { 5 }
fn default_training_seed() -> u64 { 16 }
fn default_max_depth() -> Vec<Option<usize>> { vec![Some(3), Some(5), Some(10), None] }
fn default_min_samples_split() -> Vec<usize> { vec![2, 5, 10] }
fn default_min_samples_leaf() -> Vec<usize> { vec![1, 2, 5] }
fn default_max_features() -> Vec<FeatureSampling> {
    vec![FeatureSampling::All, FeatureSampling::Sqrt, FeatureSampling::Log2]
}
fn default_raw_dir() -> PathBuf { PathBuf::from("data/raw") }
fn default_processed_dir() -> PathBuf { PathBuf::from("data/processed") }
fn default_model_dir() -> PathBuf { PathBuf::from("data/model") }
fn default_image_dir() -> PathBuf { PathBuf::from("data/img") }

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            policy: ValidationPolicy::default(),
            max_missing_ratio: default_max_missing_ratio(),
            min_class_ratio: default_min_class_ratio(),
            max_class_ratio: default_max_class_ratio(),
            max_correlation: default_max_correlation(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            stratify_by: None,
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            threshold: default_drift_threshold(),
            include_target: false,
            fail_on_drift: default_fail_on_drift(),
            report_path: default_report_path(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            cv_folds: default_cv_folds(),
            seed: default_training_seed(),
            grid: ParamGrid::default(),
        }
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: default_max_features(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            processed_dir: default_processed_dir(),
            model_dir: default_model_dir(),
            image_dir: default_image_dir(),
        }
    }
}
