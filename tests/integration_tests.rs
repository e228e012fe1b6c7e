use anyhow::Result;
use birthweight_predictor::{
    api::{routes, AppState},
    config::ModelConfig,
    ml::{model_source_from_config, FileModelSource, PredictionInvoker},
    templates::PageRenderer,
    PredictionInput,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use warp::http::StatusCode;
use warp::test::request;

/// End-to-end tests driving the HTTP routes against real artifacts on disk
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FORM: &str = "gestation=280&parity=0&age=30&height=65&weight=130&smoke=0";

    fn linear_artifact(intercept: f64) -> String {
        format!(
            r#"{{
  "kind": "linear",
  "feature_names": ["gestation", "parity", "age", "height", "weight", "smoke"],
  "intercept": {},
  "coefficients": {{
    "gestation": 0.44, "parity": -3.3, "age": 0.0,
    "height": 1.15, "weight": 0.05, "smoke": -8.4
  }}
}}"#,
            intercept
        )
    }

    const TREE_ARTIFACT: &str = r#"
kind = "tree_ensemble"
feature_names = ["gestation", "parity", "age", "height", "weight", "smoke"]
base_score = 100.0

[[trees]]
[[trees.nodes]]
type = "split"
feature = 0
threshold = 270.0
left = 1
right = 2

[[trees.nodes]]
type = "leaf"
value = -10.0

[[trees.nodes]]
type = "leaf"
value = 20.5
"#;

    fn file_state(model_path: &Path) -> AppState {
        AppState::new(
            PredictionInvoker::new(Arc::new(FileModelSource::new(model_path))),
            PageRenderer::new("templates"),
        )
    }

    async fn post_predict(state: AppState) -> (StatusCode, String) {
        let resp = request()
            .method("POST")
            .path("/predict")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(FORM)
            .reply(&routes(state))
            .await;

        (
            resp.status(),
            String::from_utf8_lossy(resp.body()).into_owned(),
        )
    }

    /// Linear artifact: 123.2 + 74.75 + 6.5 - 80.4 = 124.05
    #[tokio::test]
    async fn test_linear_model_end_to_end() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_artifact(-80.4))?;

        let (status, body) = post_predict(file_state(&path)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<strong>124.05</strong>"), "body: {}", body);
        Ok(())
    }

    #[tokio::test]
    async fn test_tree_ensemble_from_toml() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.toml");
        std::fs::write(&path, TREE_ARTIFACT)?;

        let (status, body) = post_predict(file_state(&path)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<strong>120.50</strong>"), "body: {}", body);
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_model_output_renders_zero() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_artifact(-500.0))?;

        let (status, body) = post_predict(file_state(&path)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<strong>0.00</strong>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_requests_are_deterministic() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_artifact(-80.4))?;
        let state = file_state(&path);

        let (_, first) = post_predict(state.clone()).await;
        let (_, second) = post_predict(state.clone()).await;
        let (_, third) = post_predict(state).await;

        assert_eq!(first, second);
        assert_eq!(second, third);
        Ok(())
    }

    #[tokio::test]
    async fn test_per_request_reload_picks_up_new_model() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_artifact(-80.4))?;
        let state = file_state(&path);

        let (_, before) = post_predict(state.clone()).await;
        std::fs::write(&path, linear_artifact(-70.4))?;
        let (_, after) = post_predict(state).await;

        assert!(before.contains("124.05"));
        assert!(after.contains("134.05"));
        Ok(())
    }

    #[tokio::test]
    async fn test_preloaded_model_survives_file_removal() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, linear_artifact(-80.4))?;

        let source = model_source_from_config(&ModelConfig {
            path: path.clone(),
            reload_per_request: false,
        })
        .await?;
        std::fs::remove_file(&path)?;

        let state = AppState::new(PredictionInvoker::new(source), PageRenderer::new("templates"));
        let (status, body) = post_predict(state).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("124.05"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_model_file_is_service_unavailable() -> Result<()> {
        let dir = TempDir::new()?;
        let (status, body) = post_predict(file_state(&dir.path().join("model.json"))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Failed to load model"));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_model_file_is_service_unavailable() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"kind\": \"linear\"")?;

        let (status, _) = post_predict(file_state(&path)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_internal_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{
                "kind": "linear",
                "feature_names": ["gestation", "smoke"],
                "intercept": 1.0,
                "coefficients": {"gestation": 1.0, "smoke": 1.0}
            }"#,
        )?;

        let (status, body) = post_predict(file_state(&path)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("schema mismatch"));
        Ok(())
    }

    #[tokio::test]
    async fn test_index_never_shows_prediction() -> Result<()> {
        let dir = TempDir::new()?;
        let state = file_state(&dir.path().join("absent.json"));

        let resp = request().method("GET").path("/").reply(&routes(state)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!String::from_utf8_lossy(resp.body()).contains("class=\"prediction\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_shipped_model_artifact_is_valid() -> Result<()> {
        let model = birthweight_predictor::ml::load_artifact(Path::new("model/model.json"))
            .await?
            .into_model();

        let expected: Vec<String> = PredictionInput::FEATURES
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(model.feature_names(), expected.as_slice());
        Ok(())
    }
}
