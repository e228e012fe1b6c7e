use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::core::{PredictionInput, PredictorError};
use crate::ml::PredictionInvoker;
use crate::monitoring::TelemetryManager;
use crate::templates::{render_error_page, PageRenderer, INDEX_TEMPLATE};

/// Upper bound for a form submission body
pub const MAX_FORM_BYTES: u64 = 16 * 1024;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub invoker: Arc<PredictionInvoker>,
    pub renderer: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(invoker: PredictionInvoker, renderer: PageRenderer) -> Self {
        Self {
            invoker: Arc::new(invoker),
            renderer: Arc::new(renderer),
        }
    }
}

/// Prediction web server
pub struct PredictorServer {
    config: ServerConfig,
    state: AppState,
}

impl PredictorServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until the process is stopped
    pub async fn start(&self) -> Result<()> {
        let addr = self
            .config
            .socket_addr()
            .context("Invalid server address")?;

        info!("Starting prediction server on http://{}", addr);

        warp::serve(routes(self.state.clone())).run(addr).await;

        Ok(())
    }
}

/// All routes with errors already turned into HTML responses.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    index_route(state.clone())
        .or(predict_route(state))
        .or(health_route())
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// GET /
fn index_route(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .and(with_state(state))
        .and_then(render_form)
}

/// POST /predict
fn predict_route(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(predict)
}

/// GET /health
fn health_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&HealthStatus { status: "ok" }))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

async fn render_form(state: AppState) -> Result<impl Reply, Rejection> {
    let page = state
        .renderer
        .render(INDEX_TEMPLATE, None)
        .await
        .map_err(reject)?;

    Ok(warp::reply::html(page))
}

async fn predict(form: HashMap<String, String>, state: AppState) -> Result<impl Reply, Rejection> {
    let input = PredictionInput::try_from(&form).map_err(reject)?;
    let result = state.invoker.predict(&input).await.map_err(reject)?;
    TelemetryManager::log_prediction(&input, &result);

    let page = state
        .renderer
        .render(INDEX_TEMPLATE, Some(result))
        .await
        .map_err(reject)?;

    Ok(warp::reply::html(page))
}

/// Carries a [`PredictorError`] through warp's rejection chain
#[derive(Debug)]
struct PredictionRejection(PredictorError);

impl warp::reject::Reject for PredictionRejection {}

fn reject(error: PredictorError) -> Rejection {
    warp::reject::custom(PredictionRejection(error))
}

/// Status code for each failure class.
pub fn status_for(error: &PredictorError) -> StatusCode {
    match error {
        PredictorError::MissingField(_) => StatusCode::BAD_REQUEST,
        PredictorError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PredictorError::ModelLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PredictorError::SchemaMismatch { .. }
        | PredictorError::EmptyPrediction
        | PredictorError::NonFiniteOutput(_)
        | PredictorError::Template(_)
        | PredictorError::Config(_)
        | PredictorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Global Error Handler
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "No such page".to_string())
    } else if let Some(PredictionRejection(error)) = err.find::<PredictionRejection>() {
        TelemetryManager::log_failure(error, "predict");
        (status_for(error), error.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a form-encoded body".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Form too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    let page = render_error_page(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error"),
        &message,
    );

    Ok(warp::reply::with_status(warp::reply::html(page), status))
}
