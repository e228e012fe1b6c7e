mod telemetry;

pub use telemetry::{LogLevel, OperationTimer, TelemetryConfig, TelemetryManager};
