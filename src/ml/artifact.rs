use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::model::ModelArtifact;
use crate::core::{PredictResult, PredictorError};

/// On-disk encodings accepted for model artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Toml,
}

impl ArtifactFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> PredictResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ArtifactFormat::Json),
            Some("toml") => Ok(ArtifactFormat::Toml),
            other => Err(PredictorError::model_load(
                path,
                format!("unsupported artifact extension {:?}", other.unwrap_or("")),
            )),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ModelArtifact, String> {
        match self {
            ArtifactFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            ArtifactFormat::Toml => {
                let content = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
                toml::from_str(content).map_err(|e| e.to_string())
            }
        }
    }
}

/// Read and decode a model artifact.
///
/// The file is read in one call, so its handle is closed before decoding
/// starts, whatever the outcome.
pub async fn load_artifact(path: &Path) -> PredictResult<ModelArtifact> {
    let format = ArtifactFormat::from_path(path)?;
    let bytes = fs::read(path)
        .await
        .map_err(|e| PredictorError::model_load(path, e))?;

    debug!(path = %path.display(), bytes = bytes.len(), ?format, "Decoding model artifact");

    format
        .decode(&bytes)
        .map_err(|reason| PredictorError::model_load(path, reason))
}
