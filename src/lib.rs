//! Wine pipeline - очистка, валидация, разбиение и обучение классификатора качества вина

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
pub use types::*;
