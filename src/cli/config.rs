use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use refgate_policy_center::{load_config_with_options, AuthConfig, AuthEngine, LoadOptions};
use serde_json::Value as JsonValue;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration and where each value came from
    Show,

    /// Get configuration value
    Get {
        /// Configuration key, e.g. local_origin
        key: String,
    },

    /// Validate a configuration file without environment overlays
    Validate {
        /// File to check; defaults to the active config path
        path: Option<PathBuf>,
    },
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let output = ctx.output();
    match args.action {
        ConfigAction::Show => {
            let config = ctx.config();
            let path = ctx.config_path().display().to_string();
            output.print(config, |config| render_config(config, &path))
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(ctx.config())?;
            let Some(value) = get_json_value(&json, &key) else {
                bail!("{} not found in configuration", key);
            };
            output.print(value, |value| match value {
                JsonValue::String(s) => s.clone(),
                JsonValue::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect::<Vec<_>>()
                    .join("\n"),
                other => other.to_string(),
            })
        }
        ConfigAction::Validate { path } => {
            let path = path.unwrap_or_else(|| ctx.config_path().to_path_buf());
            if !path.exists() {
                println!("No configuration file at {}; defaults are valid", path.display());
                return Ok(());
            }
            let options = LoadOptions {
                paths: vec![path.clone()],
                include_env: false,
                overrides: Vec::new(),
            };
            let config = load_config_with_options(&options)
                .with_context(|| format!("validating {}", path.display()))?;
            AuthEngine::new(config).with_context(|| format!("validating {}", path.display()))?;
            println!("Configuration file {} is valid", path.display());
            Ok(())
        }
    }
}

/// Resolves a dotted key against the serialized config.
fn get_json_value<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    key.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn render_config(config: &AuthConfig, path: &str) -> String {
    let source = |key: &str| {
        config
            .source_of(key)
            .map(|source| format!("{:?}", source).to_lowercase())
            .unwrap_or_else(|| "-".to_string())
    };
    let mut lines = vec![format!("Current configuration ({}):", path)];
    lines.push(format!(
        "local_origin   = {:?} [{}]",
        config.local_origin,
        source("local_origin")
    ));
    lines.push(format!(
        "max_query_len  = {} [{}]",
        config.max_query_len,
        source("max_query_len")
    ));
    lines.push(format!(
        "max_search_len = {} [{}]",
        config.max_search_len,
        source("max_search_len")
    ));
    lines.push(format!("role_hierarchy [{}]:", source("role_hierarchy")));
    for edge in &config.role_hierarchy {
        lines.push(format!("  {}", edge));
    }
    lines.join("\n")
}

