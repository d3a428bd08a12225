//! Risk calculator web server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use riskcalc_core::{FeatureDictionary, ModelAdapter};
use riskcalc_web::telemetry::{init_logging, init_metrics};
use riskcalc_web::{start_server, AppConfig, AppState, SessionKey};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "riskcalc-web")]
#[command(about = "Risk calculator web front end")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web front end (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Classifier artifact path
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Load a model artifact and report whether it is usable
    CheckModel {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        model: None,
    }) {
        Command::Serve { host, port, model } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(model) = model {
                config.model_path = model;
            }
            serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckModel { path } => Ok(check_model(path)),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    init_logging(&config.log_level, &config.log_format)?;
    info!("Starting risk calculator v{}", env!("CARGO_PKG_VERSION"));

    let dictionary = FeatureDictionary::standard();
    dictionary
        .validate()
        .map_err(|e| anyhow::anyhow!("feature dictionary is inconsistent: {e}"))?;

    let metrics = init_metrics(config.metrics_enabled);
    let adapter = ModelAdapter::load(&config.model_path);

    let session = match config.session_secret.as_deref() {
        Some(secret) => SessionKey::from_hex(secret).context("invalid session_secret")?,
        None => {
            warn!("No session_secret configured; language preferences reset on restart");
            SessionKey::random()
        }
    };

    let state = AppState {
        dictionary,
        adapter,
        session,
        default_locale: config.default_lang,
        metrics,
    };

    start_server(state, &config.bind_addr()).await
}

fn check_model(path: PathBuf) -> ExitCode {
    match ModelAdapter::try_load(&path) {
        Ok(loaded) => {
            println!("{}: {} model, blake3 {}", path.display(), loaded.model.kind(), loaded.hash);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", path.display(), err);
            ExitCode::FAILURE
        }
    }
}
