pub mod error;
pub mod types;

pub use error::{PredictResult, PredictorError};
pub use types::{PredictionInput, PredictionResult};
