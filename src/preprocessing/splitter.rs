//! Детерминированное разбиение на train/test

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SplitConfig;
use crate::error::{PipelineError, Result};
use crate::storage;
use crate::types::{Dataset, SplitResult, Value};

pub struct Splitter;

impl Splitter {
    pub fn split(data: &Dataset, config: &SplitConfig) -> Result<SplitResult> {
        let fraction = config.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PipelineError::InputDomain(format!(
                "test fraction must be in (0, 1), got {}",
                fraction
            )));
        }

        let n = data.len();
        let n_test = (n as f64 * fraction).ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let (mut train_idx, mut test_idx) = match &config.stratify_by {
            None => {
                let mut indices: Vec<usize> = (0..n).collect();
                indices.shuffle(&mut rng);
                let train = indices.split_off(n_test);
                (train, indices)
            }
            Some(column) => Self::stratified_indices(data, column, n_test, &mut rng)?,
        };

        // Порядок внутри частей как в исходной таблице
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        let result = SplitResult {
            train: data.select_rows(&train_idx),
            test: data.select_rows(&test_idx),
        };

        tracing::info!(
            "Split {} rows into {} train / {} test (seed {})",
            n,
            result.train.len(),
            result.test.len(),
            config.seed
        );

        Ok(result)
    }

    /// Разбиение с записью обеих частей в CSV
    pub fn split_and_persist(
        data: &Dataset,
        config: &SplitConfig,
        train_path: &Path,
        test_path: &Path,
    ) -> Result<SplitResult> {
        let result = Self::split(data, config)?;
        storage::write_csv(&result.train, train_path)?;
        storage::write_csv(&result.test, test_path)?;
        Ok(result)
    }

    fn stratified_indices(
        data: &Dataset,
        column: &str,
        n_test: usize,
        rng: &mut StdRng,
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        let idx = data
            .column_index(column)
            .ok_or_else(|| PipelineError::MissingColumn(column.to_string()))?;

        // BTreeMap по строковому ключу, чтобы порядок классов не зависел от хэша
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, row) in data.rows.iter().enumerate() {
            groups.entry(class_key(&row[idx])).or_default().push(i);
        }

        let n = data.len() as f64;
        let mut quotas: Vec<(usize, f64)> = groups
            .values()
            .map(|members| {
                let exact = members.len() as f64 * n_test as f64 / n;
                (exact.floor() as usize, exact - exact.floor())
            })
            .collect();

        // Остаток раздаём по наибольшей дробной части
        let assigned: usize = quotas.iter().map(|q| q.0).sum();
        let mut order: Vec<usize> = (0..quotas.len()).collect();
        order.sort_by(|&a, &b| quotas[b].1.total_cmp(&quotas[a].1).then(a.cmp(&b)));
        for &g in order.iter().take(n_test.saturating_sub(assigned)) {
            quotas[g].0 += 1;
        }

        let mut train = Vec::new();
        let mut test = Vec::new();
        for (members, (quota, _)) in groups.into_values().zip(quotas) {
            let mut members = members;
            members.shuffle(rng);
            let rest = members.split_off(quota.min(members.len()));
            test.extend(members);
            train.extend(rest);
        }

        Ok((train, test))
    }
}

fn class_key(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        Value::Null => String::new(),
    }
}
