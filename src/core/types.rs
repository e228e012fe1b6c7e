use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{PredictResult, PredictorError};

/// Typed record built from one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub gestation: f64,
    pub parity: i64,
    pub age: i64,
    pub height: f64,
    pub weight: f64,
    pub smoke: i64,
}

impl PredictionInput {
    /// Column names in the order the model was trained on.
    pub const FEATURES: [&'static str; 6] =
        ["gestation", "parity", "age", "height", "weight", "smoke"];

    /// Field values as floats, ordered like [`Self::FEATURES`].
    pub fn to_row(&self) -> [f64; 6] {
        [
            self.gestation,
            self.parity as f64,
            self.age as f64,
            self.height,
            self.weight,
            self.smoke as f64,
        ]
    }
}

/// Normalized model output: rounded to two decimals, never negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PredictionResult(f64);

impl PredictionResult {
    /// Round the raw model output to two decimal places and clamp negatives to zero.
    ///
    /// Rounding works on the exact binary value with ties to even, so `0.125`
    /// becomes `0.12` and `2.675` (stored just below) becomes `2.67`.
    /// NaN and infinite outputs are rejected; there is no upper bound.
    pub fn from_raw(raw: f64) -> PredictResult<Self> {
        if !raw.is_finite() {
            return Err(PredictorError::NonFiniteOutput(raw));
        }

        let rounded = round_two_decimals(raw).ok_or(PredictorError::NonFiniteOutput(raw))?;
        // `<=` also folds -0.0 into 0.0
        if rounded <= 0.0 {
            Ok(Self(0.0))
        } else {
            Ok(Self(rounded))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Fixed-precision formatting rounds the exact decimal expansion, ties to
/// even, and never scales the value, so large finite inputs stay finite.
fn round_two_decimals(raw: f64) -> Option<f64> {
    format!("{:.2}", raw)
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
