//! Нормализация имён колонок и удаление дубликатов

use std::collections::{HashMap, HashSet};

use crate::types::Dataset;

/// Каноническое имя: нижний регистр, разделители схлопываются в `_`
pub fn canonical_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

pub struct ColumnNormalizer;

impl ColumnNormalizer {
    pub fn normalize(data: &Dataset) -> Dataset {
        let columns = Self::unique_names(&data.columns);

        // Дубликаты строк: остаётся первое вхождение
        let mut seen = HashSet::with_capacity(data.rows.len());
        let rows: Vec<_> = data
            .rows
            .iter()
            .filter(|row| seen.insert(*row))
            .cloned()
            .collect();

        let dropped = data.rows.len() - rows.len();
        tracing::info!(
            "Normalized {} columns, dropped {} duplicate rows ({} remain)",
            columns.len(),
            dropped,
            rows.len()
        );

        Dataset { columns, rows }
    }

    fn unique_names(raw: &[String]) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut taken: HashSet<String> = HashSet::new();
        let mut names = Vec::with_capacity(raw.len());

        for name in raw {
            let mut base = canonical_column_name(name);
            if base.is_empty() {
                base = "column".to_string();
            }

            let mut candidate = base.clone();
            while taken.contains(&candidate) {
                let n = counts.entry(base.clone()).or_insert(1);
                *n += 1;
                candidate = format!("{}_{}", base, n);
            }

            taken.insert(candidate.clone());
            names.push(candidate);
        }

        names
    }
}
