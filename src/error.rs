//! Ошибки пайплайна

use thiserror::Error;

use crate::validation::drift::DriftReport;
use crate::validation::ValidationReport;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InputDomain(String),

    #[error("required column '{0}' not found")]
    MissingColumn(String),

    #[error("unknown dataset id {0}")]
    UnknownDataset(u32),

    #[error("validation failed with {} violation(s)", .0.violations.len())]
    ValidationFailed(ValidationReport),

    #[error("drift detected in: {}", .0.drifted_features().join(", "))]
    DriftDetected(Box<DriftReport>),

    #[error("training failed: {0}")]
    Training(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Render(#[from] handlebars::RenderError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
