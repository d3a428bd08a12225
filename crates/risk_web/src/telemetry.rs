//! Logging and metrics bootstrap

use anyhow::Result;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber; `RUST_LOG` takes precedence over `level`
pub fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

pub fn init_metrics(enabled: bool) -> Option<PrometheusHandle> {
    if !enabled {
        info!("Prometheus metrics disabled via configuration");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder registered");
            describe_counter!(
                "riskcalc_predictions_total",
                "Predictions served, labelled by source (model or fallback)"
            );
            describe_gauge!(
                "riskcalc_model_loaded",
                "1 when a classifier is loaded, 0 in degraded mode"
            );
            describe_counter!(
                "riskcalc_prediction_errors_total",
                "Submissions rejected or failed, labelled by stage"
            );
            Some(handle)
        }
        Err(err) => {
            warn!("Failed to install Prometheus metrics recorder: {}", err);
            None
        }
    }
}
