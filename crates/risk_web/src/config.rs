//! Layered configuration: TOML file, then `RISKCALC_*` environment variables

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use riskcalc_core::Locale;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/riskcalc.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    /// Classifier artifact loaded once at startup
    pub model_path: PathBuf,

    /// Hex-encoded 32-byte key for signing the session cookie
    pub session_secret: Option<String>,

    /// Language used when neither the form nor the session names one
    pub default_lang: Locale,

    pub log_level: String,
    /// `pretty` or `compact`
    pub log_format: String,

    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from("model/risk_model.json"),
            session_secret: None,
            default_lang: Locale::ZhCn,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load from an explicit file, or from [`DEFAULT_CONFIG_PATH`] when it exists
    pub fn load(config_path_override: Option<&Path>) -> Result<Self> {
        let resolved_path = match config_path_override {
            Some(path) if !path.exists() => bail!(
                "Configuration file {} not found (specified via --config)",
                path.display()
            ),
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix("RISKCALC").try_parsing(true));

        let config = builder.build().context("failed to assemble configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration values")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
