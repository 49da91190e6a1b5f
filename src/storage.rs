//! Работа с файлами: каталоги, CSV, источник датасета

use std::path::{Path, PathBuf};

use crate::config::RAW_FILE_NAME;
use crate::error::{PipelineError, Result};
use crate::types::{ColumnKind, Dataset, Value};

/// Создаёт каталог, если его нет. Существующий каталог не ошибка.
pub fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_dir() {
        tracing::info!("Directory '{}' already exists", dir.display());
    } else {
        std::fs::create_dir_all(dir)?;
        tracing::info!("Directory '{}' created", dir.display());
    }
    Ok(dir.to_path_buf())
}

pub fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|c| infer_kind(raw.iter().map(|r| r.get(c).map(String::as_str).unwrap_or(""))))
        .collect();

    let rows = raw
        .into_iter()
        .map(|record| {
            record
                .iter()
                .zip(&kinds)
                .map(|(cell, kind)| parse_cell(cell, *kind))
                .collect()
        })
        .collect();

    let data = Dataset::new(columns, rows)?;
    tracing::debug!("Read {} rows from '{}'", data.len(), path.display());
    Ok(data)
}

pub fn write_csv(data: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&data.columns)?;
    for row in &data.rows {
        writer.write_record(row.iter().map(format_cell))?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} rows to '{}'", data.len(), path.display());
    Ok(())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = None;
    for cell in cells.filter(|c| !c.is_empty()) {
        if cell.parse::<i64>().is_ok() {
            kind.get_or_insert(ColumnKind::Int);
        } else if cell.parse::<f64>().is_ok() {
            kind = Some(ColumnKind::Float);
        } else {
            return ColumnKind::Text;
        }
    }
    // Колонка из одних пустых ячеек считается float
    kind.unwrap_or(ColumnKind::Float)
}

fn parse_cell(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() || (kind != ColumnKind::Text && cell.eq_ignore_ascii_case("nan")) {
        return Value::Null;
    }
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Text => Value::Text(cell.to_string()),
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        // Debug у f64 всегда сохраняет точку или экспоненту: 7.0, 1e-7
        Value::Float(v) => format!("{:?}", v),
        Value::Text(s) => s.clone(),
        Value::Null => String::new(),
    }
}

/// Источник исходного датасета по числовому идентификатору
pub trait DatasetSource {
    fn fetch(&self, id: u32) -> Result<Dataset>;
}

/// Источник из локального каталога: `<root>/<id>.csv`
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetSource for DirectorySource {
    fn fetch(&self, id: u32) -> Result<Dataset> {
        let path = self.root.join(format!("{}.csv", id));
        if !path.is_file() {
            return Err(PipelineError::UnknownDataset(id));
        }
        read_csv(&path)
    }
}

/// Загружает датасет и сохраняет его в `<dir>/wine_quality_combined.csv`
pub fn download(source: &dyn DatasetSource, id: u32, dir: &Path) -> Result<PathBuf> {
    tracing::info!("Fetching dataset {}", id);
    let data = source.fetch(id)?;
    let path = ensure_dir(dir)?.join(RAW_FILE_NAME);
    write_csv(&data, &path)?;
    tracing::info!("Dataset saved as '{}'", path.display());
    Ok(path)
}
