/// Типы данных пайплайна

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Значение одной ячейки таблицы
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Числовое представление (int расширяется до f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) | Value::Null => None,
        }
    }
}

// Сравнение float побитовое, чтобы строки можно было класть в HashSet
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
            Value::Null => {}
        }
    }
}

/// Тип колонки, выведенный при чтении CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Таблица: упорядоченные строки с общим набором колонок
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Таблица из JSON до проверки длины строк и имён колонок
#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = PipelineError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Dataset::new(raw.columns, raw.rows)
    }
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::InputDomain(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(PipelineError::InputDomain(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Значения колонки как f64; null и текст дают None
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.column(name)?.map(Value::as_f64).collect())
    }

    /// Колонка числовая, если в ней нет текстовых ячеек
    pub fn is_numeric(&self, name: &str) -> bool {
        match self.column(name) {
            Ok(mut values) => values.all(|v| !matches!(v, Value::Text(_))),
            Err(_) => false,
        }
    }

    /// Числовые колонки, кроме целевой
    pub fn feature_names(&self, target: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.as_str() != target && self.is_numeric(c))
            .cloned()
            .collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Результат разбиения на train/test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    pub train: Dataset,
    pub test: Dataset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let err = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Int(1)]],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InputDomain(_)));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Dataset::new(vec!["a".into(), "a".into()], Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InputDomain(_)));
    }

    #[test]
    fn json_goes_through_constructor() {
        let ragged = r#"{"columns": ["a", "b"], "rows": [[1, 2], [3]]}"#;
        assert!(serde_json::from_str::<Dataset>(ragged).is_err());

        let duplicated = r#"{"columns": ["a", "a"], "rows": []}"#;
        assert!(serde_json::from_str::<Dataset>(duplicated).is_err());

        let ok: Dataset = serde_json::from_str(r#"{"columns": ["a"], "rows": [[1.5]]}"#).unwrap();
        assert_eq!(ok.rows, vec![vec![Value::Float(1.5)]]);
    }

    #[test]
    fn feature_names_skip_target_and_text() {
        let ds = Dataset::new(
            vec!["x".into(), "label".into(), "quality".into()],
            vec![vec![Value::Float(1.0), Value::Text("red".into()), Value::Int(5)]],
        )
        .unwrap();
        assert_eq!(ds.feature_names("quality"), vec!["x".to_string()]);
    }

    #[test]
    fn float_values_hash_by_bits() {
        let mut set = HashSet::new();
        set.insert(vec![Value::Float(0.5), Value::Null]);
        assert!(!set.insert(vec![Value::Float(0.5), Value::Null]));
        assert!(set.insert(vec![Value::Float(0.25), Value::Null]));
    }
}
