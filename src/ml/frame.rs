use ndarray::{Array2, ArrayView1};

use crate::core::{PredictResult, PredictionInput, PredictorError};

/// Tabular model input with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureFrame {
    /// Create a frame, checking that every row has one value per column
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> PredictResult<Self> {
        if values.ncols() != columns.len() {
            return Err(PredictorError::SchemaMismatch {
                expected: columns,
                found: (0..values.ncols()).map(|i| format!("column_{}", i)).collect(),
            });
        }

        Ok(Self { columns, values })
    }

    /// Single-row frame holding one prediction input.
    pub fn from_input(input: &PredictionInput) -> Self {
        let columns = PredictionInput::FEATURES
            .iter()
            .map(|name| name.to_string())
            .collect();
        let row = input.to_row();
        let values = Array2::from_shape_fn((1, row.len()), |(_, col)| row[col]);

        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.values.rows().into_iter()
    }

    /// Fail unless the frame's columns match `expected` exactly, order included.
    pub fn ensure_schema(&self, expected: &[String]) -> PredictResult<()> {
        if self.columns.as_slice() == expected {
            return Ok(());
        }

        Err(PredictorError::SchemaMismatch {
            expected: expected.to_vec(),
            found: self.columns.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_input() -> PredictionInput {
        PredictionInput {
            gestation: 280.0,
            parity: 0,
            age: 30,
            height: 65.0,
            weight: 130.0,
            smoke: 1,
        }
    }

    #[test]
    fn test_single_row_from_input() {
        let frame = FeatureFrame::from_input(&sample_input());

        assert_eq!(frame.nrows(), 1);
        assert_eq!(
            frame.columns(),
            &["gestation", "parity", "age", "height", "weight", "smoke"]
        );
        assert_eq!(frame.values(), &array![[280.0, 0.0, 30.0, 65.0, 130.0, 1.0]]);
    }

    #[test]
    fn test_schema_check_is_order_sensitive() {
        let frame = FeatureFrame::from_input(&sample_input());
        let mut expected: Vec<String> = frame.columns().to_vec();
        assert!(frame.ensure_schema(&expected).is_ok());

        expected.swap(0, 1);
        assert!(matches!(
            frame.ensure_schema(&expected),
            Err(PredictorError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_schema_check_rejects_missing_columns() {
        let frame = FeatureFrame::from_input(&sample_input());
        let expected = vec!["gestation".to_string(), "age".to_string()];
        assert!(frame.ensure_schema(&expected).is_err());
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let result = FeatureFrame::new(vec!["a".to_string()], array![[1.0, 2.0]]);
        assert!(result.is_err());
    }
}
