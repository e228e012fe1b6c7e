use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use birthweight_predictor::api::{AppState, PredictorServer};
use birthweight_predictor::config::AppConfig;
use birthweight_predictor::ml::{
    load_artifact, model_source_from_config, FileModelSource, PredictionInvoker,
};
use birthweight_predictor::monitoring::TelemetryManager;
use birthweight_predictor::templates::PageRenderer;
use birthweight_predictor::PredictionInput;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "BIRTHWEIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Load the model once at startup instead of on every request
        #[arg(long)]
        preload: bool,
    },
    /// Run a single prediction and print it
    Predict {
        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[command(flatten)]
        fields: PredictFields,
    },
    /// Print the kind and feature schema of a model artifact
    InspectModel {
        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

/// Raw field values, parsed the same way as a form submission
#[derive(Args)]
struct PredictFields {
    /// Gestation in days
    #[arg(long, allow_hyphen_values = true)]
    gestation: String,
    /// Number of previous pregnancies
    #[arg(long, allow_hyphen_values = true)]
    parity: String,
    /// Mother's age in years
    #[arg(long, allow_hyphen_values = true)]
    age: String,
    /// Mother's height in inches
    #[arg(long, allow_hyphen_values = true)]
    height: String,
    /// Mother's weight in pounds
    #[arg(long, allow_hyphen_values = true)]
    weight: String,
    /// 1 if the mother smokes, 0 otherwise
    #[arg(long, allow_hyphen_values = true)]
    smoke: String,
}

impl PredictFields {
    fn into_form(self) -> HashMap<String, String> {
        [
            ("gestation", self.gestation),
            ("parity", self.parity),
            ("age", self.age),
            ("height", self.height),
            ("weight", self.weight),
            ("smoke", self.smoke),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        model: None,
        preload: false,
    });

    match command {
        Commands::Serve {
            host,
            port,
            model,
            preload,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(model) = model {
                config.model.path = model;
            }
            if preload {
                config.model.reload_per_request = false;
            }

            TelemetryManager::init(Some(config.telemetry.clone()))?;
            serve(config).await
        }
        Commands::Predict { model, fields } => {
            let path = model.unwrap_or(config.model.path);
            let input = PredictionInput::try_from(&fields.into_form())?;

            let invoker = PredictionInvoker::new(Arc::new(FileModelSource::new(&path)));
            let result = invoker
                .predict(&input)
                .await
                .with_context(|| format!("Prediction with {} failed", path.display()))?;

            println!("{}", result);
            Ok(())
        }
        Commands::InspectModel { model } => {
            let path = model.unwrap_or(config.model.path);
            let model = load_artifact(&path).await?.into_model();

            println!("path:     {}", path.display());
            println!("kind:     {}", model.kind());
            println!("features: {}", model.feature_names().join(", "));
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let source = model_source_from_config(&config.model)
        .await
        .context("Failed to prepare model source")?;
    info!(model = %source.describe(), "Model source ready");

    let state = AppState::new(
        PredictionInvoker::new(source),
        PageRenderer::new(&config.templates.directory),
    );

    PredictorServer::new(config.server, state).start().await
}
