use std::path::PathBuf;

use anyhow::{Context, Result};
use refgate_policy_center::{load_config_with_options, AuthEngine, LoadOptions};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        return Ok(path.clone());
    }
    // Priority: ./config/refgate.yaml > ~/.config/refgate/config.yaml
    let local_config = PathBuf::from("config/refgate.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("refgate");
    path.push("config.yaml");
    Ok(path)
}

pub struct LoadedEngine {
    pub engine: AuthEngine,
    pub path: PathBuf,
}

pub fn load_engine(config_path: Option<&PathBuf>, overrides: &[String]) -> Result<LoadedEngine> {
    let path = resolve_config_path(config_path)?;
    debug!("Resolved configuration path: {}", path.display());

    let mut options = LoadOptions::with_path(path.clone());
    options.overrides = overrides.to_vec();
    let config = load_config_with_options(&options)
        .with_context(|| format!("loading auth config from {}", path.display()))?;
    let engine = AuthEngine::new(config).context("building auth engine")?;
    Ok(LoadedEngine { engine, path })
}
