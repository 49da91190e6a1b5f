/// Классификатор качества и его метрики

pub mod diagnostics;
pub mod evaluation;
pub mod training;

pub use diagnostics::{ConfusionMatrix, Histogram};
pub use evaluation::ClassificationReport;
pub use training::{FeatureImportance, ModelTrainer, TrainedModel, TreeParams};
