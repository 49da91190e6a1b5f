/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod splitter;

pub use feature_engineering::FeatureEngineer;
pub use normalization::ColumnNormalizer;
pub use splitter::Splitter;
