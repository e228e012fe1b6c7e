//! Turns raw form submissions into typed prediction records.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::str::FromStr;

use crate::core::{PredictResult, PredictionInput, PredictorError};

/// Build a [`PredictionInput`] from form fields.
///
/// Every field must be present. Floats are accepted for gestation, height and
/// weight; parity, age and smoke must be integers.
pub fn parse_prediction_input<S: BuildHasher>(
    form: &HashMap<String, String, S>,
) -> PredictResult<PredictionInput> {
    Ok(PredictionInput {
        gestation: parse_field(form, "gestation", "a float")?,
        parity: parse_field(form, "parity", "an integer")?,
        age: parse_field(form, "age", "an integer")?,
        height: parse_field(form, "height", "a float")?,
        weight: parse_field(form, "weight", "a float")?,
        smoke: parse_field(form, "smoke", "an integer")?,
    })
}

impl<S: BuildHasher> TryFrom<&HashMap<String, String, S>> for PredictionInput {
    type Error = PredictorError;

    fn try_from(form: &HashMap<String, String, S>) -> PredictResult<Self> {
        parse_prediction_input(form)
    }
}

fn parse_field<T, S>(
    form: &HashMap<String, String, S>,
    field: &str,
    expected: &'static str,
) -> PredictResult<T>
where
    T: FromStr,
    S: BuildHasher,
{
    let raw = form
        .get(field)
        .ok_or_else(|| PredictorError::MissingField(field.to_string()))?;

    raw.trim().parse().map_err(|_| PredictorError::InvalidField {
        field: field.to_string(),
        value: raw.clone(),
        expected,
    })
}
