use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Missing form field: {0}")]
    MissingField(String),

    #[error("Invalid value {value:?} for field '{field}': expected {expected}")]
    InvalidField {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Failed to load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Feature schema mismatch: model expects {expected:?}, input provides {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Model returned no prediction")]
    EmptyPrediction,

    #[error("Model produced a non-finite value: {0}")]
    NonFiniteOutput(f64),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictorError {
    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the submitted form rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidField { .. })
    }
}

pub type PredictResult<T> = Result<T, PredictorError>;
