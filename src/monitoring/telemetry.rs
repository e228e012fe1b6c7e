use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{PredictionInput, PredictionResult, PredictorError};

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub log_level: LogLevel,
    /// Include the module path in each log line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: LogLevel::Info,
            with_target: false,
        }
    }
}

/// Log levels matching tracing's levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Logs how long an operation took when dropped.
pub struct OperationTimer {
    start_time: Instant,
    operation_name: &'static str,
}

impl OperationTimer {
    pub fn new(operation_name: &'static str) -> Self {
        Self {
            start_time: Instant::now(),
            operation_name,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start_time.elapsed();
        debug!(
            operation = %self.operation_name,
            duration_us = %duration.as_micros(),
            "Operation completed"
        );
    }
}

/// Owns the logging setup and the request-level log events.
pub struct TelemetryManager {
    config: TelemetryConfig,
}

impl TelemetryManager {
    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(config: Option<TelemetryConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        if config.enabled {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));

            let fmt_layer = fmt::layer().with_target(config.with_target);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Log a served prediction
    pub fn log_prediction(input: &PredictionInput, result: &PredictionResult) {
        info!(
            gestation = input.gestation,
            parity = input.parity,
            age = input.age,
            height = input.height,
            weight = input.weight,
            smoke = input.smoke,
            prediction = result.value(),
            "Prediction served"
        );
    }

    /// Log a failed request; client mistakes at warn, server faults at error.
    pub fn log_failure(error: &PredictorError, context: &str) {
        if error.is_client_error() {
            warn!(error = %error, context = context, "Request rejected");
        } else {
            error!(error = %error, context = context, "Request failed");
        }
    }
}
