/// Валидация данных: схема, проверки датасета, дрейф

pub mod checks;
pub mod drift;
pub mod schema;

use serde::{Deserialize, Serialize};

use crate::config::{ValidationConfig, ValidationPolicy};
use crate::error::{PipelineError, Result};
use crate::types::Dataset;

pub use checks::DatasetCheck;
pub use drift::{DriftChecker, DriftReport};
pub use schema::{ColumnRule, ColumnType, Schema, ValueCheck};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub check: String,
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations_for(&self, column: &str) -> impl Iterator<Item = &Violation> + '_ {
        let column = column.to_string();
        self.violations
            .iter()
            .filter(move |v| v.column.as_deref() == Some(column.as_str()))
    }
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// Выполняет все правила схемы и собирает нарушения
    pub fn validate(data: &Dataset, schema: &Schema) -> ValidationReport {
        let mut violations = Vec::new();

        for rule in &schema.columns {
            Self::validate_column(data, rule, &mut violations);
        }

        for check in &schema.dataset_checks {
            if let Err(message) = check.evaluate(data) {
                violations.push(Violation {
                    check: check.name().to_string(),
                    column: None,
                    message,
                });
            }
        }

        let report = ValidationReport { violations };
        if report.is_valid() {
            tracing::info!("Data is valid!");
        } else {
            for v in &report.violations {
                tracing::warn!("Validation error [{}]: {}", v.check, v.message);
            }
        }
        report
    }

    /// Валидация с учётом политики: Warn пропускает, Fail возвращает ошибку
    pub fn enforce(data: &Dataset, schema: &Schema, config: &ValidationConfig) -> Result<ValidationReport> {
        let report = Self::validate(data, schema);
        match config.policy {
            ValidationPolicy::Fail if !report.is_valid() => Err(PipelineError::ValidationFailed(report)),
            _ => Ok(report),
        }
    }

    fn validate_column(data: &Dataset, rule: &ColumnRule, out: &mut Vec<Violation>) {
        let mut push = |check: &str, message: String| {
            out.push(Violation {
                check: check.to_string(),
                column: Some(rule.name.clone()),
                message,
            })
        };

        let Ok(values) = data.column(&rule.name) else {
            push("column_present", format!("column '{}' not in dataframe", rule.name));
            return;
        };
        let values: Vec<_> = values.collect();

        let wrong_type = values.iter().filter(|v| !rule.dtype.accepts(v)).count();
        if wrong_type > 0 {
            push(
                "dtype",
                format!(
                    "expected series '{}' to have type {:?}, {} value(s) do not match",
                    rule.name, rule.dtype, wrong_type
                ),
            );
        }

        let nulls = values.iter().filter(|v| v.is_null()).count();
        if !rule.nullable && nulls > 0 {
            push(
                "not_nullable",
                format!("non-nullable series '{}' contains {} null value(s)", rule.name, nulls),
            );
        }

        for check in &rule.checks {
            let failed = values
                .iter()
                .filter(|v| !v.is_null() && !check.passes(v))
                .count();
            if failed > 0 {
                push(
                    &check.describe(),
                    format!(
                        "column '{}' failed {} for {} row(s)",
                        rule.name,
                        check.describe(),
                        failed
                    ),
                );
            }
        }
    }
}
