//! Статическая схема датасета

use serde::{Deserialize, Serialize};

use crate::config::ValidationConfig;
use crate::types::Value;
use crate::validation::checks::{
    ClassBalanceWithin, DatasetCheck, FeatureCorrelationBelow, MissingnessBelow, NoDuplicateRows,
    NoEmptyRows, TargetCorrelationBelow,
};

/// Химические показатели вина, все неотрицательные float
pub const WINE_FEATURES: [&str; 11] = [
    "fixed_acidity",
    "volatile_acidity",
    "citric_acid",
    "residual_sugar",
    "chlorides",
    "free_sulfur_dioxide",
    "total_sulfur_dioxide",
    "density",
    "ph",
    "sulphates",
    "alcohol",
];

pub const QUALITY_LEVELS: [i64; 7] = [3, 4, 5, 6, 7, 8, 9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Float,
    Int,
}

impl ColumnType {
    /// Float принимает и целые значения, Int только целые
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Float, Value::Float(_) | Value::Int(_)) => true,
            (ColumnType::Int, Value::Int(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueCheck {
    GreaterOrEqual(f64),
    LessOrEqual(f64),
    IsIn(Vec<i64>),
}

impl ValueCheck {
    pub fn passes(&self, value: &Value) -> bool {
        match self {
            ValueCheck::GreaterOrEqual(min) => value.as_f64().is_some_and(|v| v >= *min),
            ValueCheck::LessOrEqual(max) => value.as_f64().is_some_and(|v| v <= *max),
            ValueCheck::IsIn(allowed) => match value {
                Value::Int(v) => allowed.contains(v),
                _ => false,
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ValueCheck::GreaterOrEqual(min) => format!("greater_than_or_equal_to({})", min),
            ValueCheck::LessOrEqual(max) => format!("less_than_or_equal_to({})", max),
            ValueCheck::IsIn(allowed) => format!("isin({:?})", allowed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub name: String,
    pub dtype: ColumnType,
    pub nullable: bool,
    pub checks: Vec<ValueCheck>,
}

impl ColumnRule {
    pub fn non_negative_float(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dtype: ColumnType::Float,
            nullable: false,
            checks: vec![ValueCheck::GreaterOrEqual(0.0)],
        }
    }
}

pub struct Schema {
    pub columns: Vec<ColumnRule>,
    pub dataset_checks: Vec<Box<dyn DatasetCheck>>,
}

impl Schema {
    /// Схема датасета качества вина
    pub fn wine_quality(config: &ValidationConfig) -> Self {
        let target = config.target.as_str();

        let mut columns: Vec<ColumnRule> = WINE_FEATURES
            .iter()
            .map(|name| ColumnRule::non_negative_float(name))
            .collect();
        if let Some(ph) = columns.iter_mut().find(|c| c.name == "ph") {
            ph.checks.push(ValueCheck::LessOrEqual(14.0));
        }
        columns.push(ColumnRule {
            name: target.to_string(),
            dtype: ColumnType::Int,
            nullable: false,
            checks: vec![ValueCheck::IsIn(QUALITY_LEVELS.to_vec())],
        });

        let dataset_checks: Vec<Box<dyn DatasetCheck>> = vec![
            Box::new(NoDuplicateRows),
            Box::new(NoEmptyRows),
            Box::new(MissingnessBelow { limit: config.max_missing_ratio }),
            Box::new(ClassBalanceWithin {
                target: target.to_string(),
                min: config.min_class_ratio,
                max: config.max_class_ratio,
            }),
            Box::new(TargetCorrelationBelow {
                target: target.to_string(),
                limit: config.max_correlation,
            }),
            Box::new(FeatureCorrelationBelow {
                target: target.to_string(),
                limit: config.max_correlation,
            }),
        ];

        Self { columns, dataset_checks }
    }
}
