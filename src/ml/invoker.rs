use std::sync::Arc;
use tracing::debug;

use super::frame::FeatureFrame;
use super::source::ModelSource;
use crate::core::{PredictResult, PredictionInput, PredictionResult, PredictorError};
use crate::monitoring::OperationTimer;

/// Runs one prediction: acquire model, build the frame, predict, normalize.
pub struct PredictionInvoker {
    source: Arc<dyn ModelSource>,
}

impl PredictionInvoker {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self { source }
    }

    pub async fn predict(&self, input: &PredictionInput) -> PredictResult<PredictionResult> {
        let _timer = OperationTimer::new("predict");

        let model = self.source.acquire().await?;
        let frame = FeatureFrame::from_input(input);
        frame.ensure_schema(model.feature_names())?;

        let raw = model
            .predict(&frame)?
            .first()
            .copied()
            .ok_or(PredictorError::EmptyPrediction)?;

        debug!(raw, kind = model.kind(), "Raw model output");
        PredictionResult::from_raw(raw)
    }
}
