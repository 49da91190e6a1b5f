//! Последовательный запуск стадий

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::diagnostics::{self, ConfusionMatrix};
use crate::models::{ClassificationReport, FeatureImportance, ModelTrainer, TreeParams};
use crate::preprocessing::{ColumnNormalizer, FeatureEngineer, Splitter};
use crate::storage;
use crate::types::{Dataset, SplitResult};
use crate::validation::{DriftChecker, DriftReport, Schema, SchemaValidator, ValidationReport};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedData {
    pub validation: ValidationReport,
    pub split: SplitResult,
    pub drift: DriftReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub params: TreeParams,
    pub cv_accuracy: f64,
    pub test_accuracy: f64,
    pub report: ClassificationReport,
    pub importances: Vec<FeatureImportance>,
    pub confusion: ConfusionMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub valid: bool,
    pub drift_passed: bool,
    pub training: TrainingSummary,
}

pub struct Pipeline;

impl Pipeline {
    /// Чтение сырого CSV и подготовка данных
    pub fn prepare(config: &PipelineConfig) -> Result<PreparedData> {
        storage::ensure_dir(&config.paths.processed_dir)?;
        let raw = storage::read_csv(&config.paths.raw_csv())?;
        Self::prepare_dataset(&raw, config)
    }

    /// normalize → validate → split → drift
    pub fn prepare_dataset(raw: &Dataset, config: &PipelineConfig) -> Result<PreparedData> {
        config.target()?;
        let clean = ColumnNormalizer::normalize(raw);

        let schema = Schema::wine_quality(&config.validation);
        let validation = SchemaValidator::enforce(&clean, &schema, &config.validation)?;

        let split = Splitter::split_and_persist(
            &clean,
            &config.split,
            &config.paths.train_csv(),
            &config.paths.test_csv(),
        )?;

        let drift = match DriftChecker::check(&split.train, &split.test, &config.drift) {
            Ok(report) => report,
            Err(PipelineError::DriftDetected(report)) if !config.drift.fail_on_drift => {
                tracing::warn!("Continuing despite drift (fail_on_drift = false)");
                *report
            }
            Err(e) => return Err(e),
        };

        Ok(PreparedData {
            validation,
            split,
            drift,
        })
    }

    /// Обучение, оценка и сохранение артефактов
    pub fn train(config: &PipelineConfig, split: &SplitResult) -> Result<TrainingSummary> {
        let target = config.target()?;
        let paths = &config.paths;
        storage::ensure_dir(&paths.model_dir)?;
        storage::ensure_dir(&paths.image_dir)?;

        let model = ModelTrainer::train(&split.train, &config.training)?;
        model.save(&paths.model_json())?;

        let importances = model.feature_importances();
        write_importances(&importances, &paths.feature_importance_csv())?;

        let predicted = model.predict(&split.test)?.to_vec();
        let (_, labels, _) = FeatureEngineer::extract_features(&split.test, target)?;
        let actual = labels.to_vec();

        let report = ClassificationReport::new(&actual, &predicted)?;
        report.write_csv(&paths.classification_report_csv())?;
        tracing::info!("Test Accuracy: {:.4}", report.accuracy);

        let confusion = ConfusionMatrix::new(&actual, &predicted);
        diagnostics::save_json(
            &diagnostics::feature_histograms(&split.train, 40),
            &paths.image_dir.join("eda.json"),
        )?;
        diagnostics::save_json(&confusion.to_long(), &paths.image_dir.join("confusion.json"))?;
        diagnostics::save_json(&importances, &paths.image_dir.join("features.json"))?;

        Ok(TrainingSummary {
            params: model.params,
            cv_accuracy: model.cv_accuracy,
            test_accuracy: report.accuracy,
            report,
            importances,
            confusion,
        })
    }

    pub fn run(config: &PipelineConfig) -> Result<PipelineSummary> {
        let prepared = Self::prepare(config)?;
        let training = Self::train(config, &prepared.split)?;

        Ok(PipelineSummary {
            rows: prepared.split.train.len() + prepared.split.test.len(),
            train_rows: prepared.split.train.len(),
            test_rows: prepared.split.test.len(),
            valid: prepared.validation.is_valid(),
            drift_passed: prepared.drift.passed,
            training,
        })
    }
}

fn write_importances(importances: &[FeatureImportance], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Feature", "Importance"])?;
    for item in importances {
        writer.write_record([item.feature.clone(), item.importance.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
