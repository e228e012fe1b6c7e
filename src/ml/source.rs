use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::artifact::load_artifact;
use super::model::RegressionModel;
use crate::config::ModelConfig;
use crate::core::PredictResult;

/// Where the invoker gets its model from.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn acquire(&self) -> PredictResult<Arc<dyn RegressionModel>>;

    fn describe(&self) -> String;
}

/// Reads and decodes the artifact on every call, so a replaced file is
/// picked up by the next request.
#[derive(Debug, Clone)]
pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModelSource for FileModelSource {
    async fn acquire(&self) -> PredictResult<Arc<dyn RegressionModel>> {
        let model = load_artifact(&self.path).await?.into_model();
        debug!(path = %self.path.display(), kind = model.kind(), "Model loaded for request");
        Ok(model)
    }

    fn describe(&self) -> String {
        format!("per-request reload of {}", self.path.display())
    }
}

/// Model decoded once and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct PreloadedModelSource {
    model: Arc<dyn RegressionModel>,
}

impl PreloadedModelSource {
    pub fn new(model: Arc<dyn RegressionModel>) -> Self {
        Self { model }
    }

    pub async fn load(path: &Path) -> PredictResult<Self> {
        let model = load_artifact(path).await?.into_model();
        info!(
            path = %path.display(),
            kind = model.kind(),
            features = ?model.feature_names(),
            "Model preloaded"
        );
        Ok(Self::new(model))
    }
}

#[async_trait]
impl ModelSource for PreloadedModelSource {
    async fn acquire(&self) -> PredictResult<Arc<dyn RegressionModel>> {
        Ok(Arc::clone(&self.model))
    }

    fn describe(&self) -> String {
        format!("preloaded {} model", self.model.kind())
    }
}

/// Build the source selected by `model.reload_per_request`.
pub async fn model_source_from_config(config: &ModelConfig) -> PredictResult<Arc<dyn ModelSource>> {
    if config.reload_per_request {
        Ok(Arc::new(FileModelSource::new(&config.path)))
    } else {
        Ok(Arc::new(PreloadedModelSource::load(&config.path).await?))
    }
}
