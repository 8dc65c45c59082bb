//! Service binary hosting one simulated control task over HTTP.
//!
//! Each process hosts exactly one task, selected by configuration. Run it
//! twice (once per task) to serve both cart-pole and frozen-lake.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$ENVSERVE_CONFIG` or `envserve-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the configured task and reset it once
//! 4. Serve the HTTP API until `Ctrl-C`

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use envserve_api::config::LoggingConfig;
use envserve_api::{AppState, ServiceConfig, Session, start_server};
use envserve_sim::build_environment;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

/// Config file read when `ENVSERVE_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "envserve-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, task construction, or the server
/// fails.
#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(source = %source.display(), "envserve starting");

    let server = config.server_config();
    info!(
        task = %config.task.kind,
        seed = ?config.task.seed,
        max_episode_steps = ?config.task.max_episode_steps,
        host = %server.host,
        port = server.port,
        "Configuration loaded"
    );

    // 3. Build the task and start its first episode.
    let mut session = Session::new(build_environment(&config.task)?);
    let snapshot = session.reset()?;
    info!(state = ?snapshot.observation, "Initial episode ready");

    // 4. Serve until shutdown.
    let state = Arc::new(AppState::new(session));
    start_server(&server, state).await?;

    info!("envserve stopped");
    Ok(())
}

/// Load configuration and report where it came from.
///
/// An explicit `ENVSERVE_CONFIG` path must exist. Without it the default
/// file is optional, and defaults plus environment overrides are used
/// when it is absent.
fn load_config() -> Result<(ServiceConfig, PathBuf), ServiceError> {
    if let Some(path) = std::env::var_os("ENVSERVE_CONFIG") {
        let path = PathBuf::from(path);
        let config = ServiceConfig::from_file(&path)?;
        return Ok((config, path));
    }

    let path = Path::new(DEFAULT_CONFIG_PATH);
    if path.exists() {
        return Ok((ServiceConfig::from_file(path)?, path.to_path_buf()));
    }

    let mut config = ServiceConfig::default();
    config.apply_env_overrides()?;
    Ok((config, PathBuf::from("<defaults>")))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
