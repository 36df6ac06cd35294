use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use refgate_core_types::origin::{normalize, validate_origin};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::defaults::default_config;
use crate::errors::PolicyError;
use crate::hierarchy::RoleHierarchy;
use crate::model::{AuthConfig, ConfigSource};

const ENV_PREFIX: &str = "REFGATE_AUTH__";
const ENV_JSON: &str = "REFGATE_AUTH_OVERRIDE_JSON";

pub const LOCAL_ORIGIN: &str = "local_origin";
pub const ROLE_HIERARCHY: &str = "role_hierarchy";
pub const MAX_QUERY_LEN: &str = "max_query_len";
pub const MAX_SEARCH_LEN: &str = "max_search_len";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
    /// `path=value` pairs applied last, e.g. from `--set` flags.
    pub overrides: Vec<String>,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
            overrides: Vec::new(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, PolicyError> {
    let mut options = LoadOptions::default();
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    options.include_env = true;
    load_config_with_options(&options)
}

/// Builtin defaults, then files, then environment, then explicit overrides.
///
/// The resulting role hierarchy is compiled once here so a bad edge fails the
/// load rather than the first request.
pub fn load_config_with_options(options: &LoadOptions) -> Result<AuthConfig, PolicyError> {
    let mut config = default_config();
    bootstrap_builtin_provenance(&mut config);

    for path in &options.paths {
        if path.exists() {
            info!(target: "policy-center", path = %path.display(), "loading auth config");
            let overlay = overlays_from_file(path)?;
            apply_overlays(&mut config, overlay)?;
        } else {
            warn!(target: "policy-center", path = %path.display(), "auth config file absent, using defaults");
        }
    }

    if options.include_env {
        let env_overlays = overlays_from_env()?;
        apply_overlays(&mut config, env_overlays)?;
    }

    let cli_overlays = overlays_from_pairs(&options.overrides)?;
    apply_overlays(&mut config, cli_overlays)?;

    RoleHierarchy::from_edges(&config.role_hierarchy)?;
    Ok(config)
}

struct ConfigOverlay {
    path: String,
    value: Value,
    source: ConfigSource,
}

fn apply_overlays(config: &mut AuthConfig, overlays: Vec<ConfigOverlay>) -> Result<(), PolicyError> {
    for overlay in overlays {
        apply_override(config, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

/// Parses a config document, JSON first then YAML.
pub fn parse_config_str(raw: &str) -> Result<Value, PolicyError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            let yaml_value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|yaml_err| {
                PolicyError::Invalid(format!(
                    "json error: {}; yaml error: {}",
                    json_err, yaml_err
                ))
            })?;
            serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{}", err)))
        }
    }
}

fn overlays_from_file(path: &Path) -> Result<Vec<ConfigOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
    let value = parse_config_str(&content)?;
    Ok(flatten_value(value, None, ConfigSource::File))
}

fn overlays_from_env() -> Result<Vec<ConfigOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                continue;
            }
            overlays.push(ConfigOverlay {
                path,
                value: parse_env_value(&raw),
                source: ConfigSource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
            overlays.extend(flatten_value(json_value, None, ConfigSource::Env));
        }
    }

    Ok(overlays)
}

fn overlays_from_pairs(pairs: &[String]) -> Result<Vec<ConfigOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for pair in pairs {
        let trimmed = pair.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (path, value_raw) = trimmed
            .split_once('=')
            .ok_or_else(|| PolicyError::InvalidValue(format!("expected path=value, got {trimmed}")))?;
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        overlays.push(ConfigOverlay {
            path: path.to_ascii_lowercase(),
            value: parse_env_value(value_raw.trim()),
            source: ConfigSource::Cli,
        });
    }
    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: ConfigSource) -> Vec<ConfigOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    _ => key_segment,
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => match prefix {
            Some(path) => vec![ConfigOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}

fn bootstrap_builtin_provenance(config: &mut AuthConfig) {
    for path in [LOCAL_ORIGIN, ROLE_HIERARCHY, MAX_QUERY_LEN, MAX_SEARCH_LEN] {
        config.set_provenance(path, ConfigSource::Builtin);
    }
}

/// Applies one dotted-path value. Provenance only moves when the value changes.
pub fn apply_override(
    config: &mut AuthConfig,
    path: &str,
    value: &Value,
    source: ConfigSource,
) -> Result<(), PolicyError> {
    let changed = match path {
        LOCAL_ORIGIN => {
            let origin = normalize(Some(to_str(value)?));
            validate_origin(&origin)?;
            merge(&mut config.local_origin, origin)
        }
        ROLE_HIERARCHY => merge(&mut config.role_hierarchy, to_edges(value)?),
        MAX_QUERY_LEN => merge(&mut config.max_query_len, to_usize(value)?),
        MAX_SEARCH_LEN => merge(&mut config.max_search_len, to_usize(value)?),
        path => return Err(PolicyError::UnsupportedPath(path.to_string())),
    };
    if changed {
        debug!(target: "policy-center", path, ?source, "auth config value overridden");
        config.set_provenance(path, source);
    }
    Ok(())
}

fn merge<T: PartialEq>(target: &mut T, candidate: T) -> bool {
    if *target == candidate {
        return false;
    }
    *target = candidate;
    true
}

fn to_str(value: &Value) -> Result<&str, PolicyError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(""),
        other => Err(PolicyError::InvalidValue(format!(
            "expected string, got {other}"
        ))),
    }
}

fn to_usize(value: &Value) -> Result<usize, PolicyError> {
    value
        .as_u64()
        .filter(|v| *v > 0)
        .map(|v| v as usize)
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected positive integer, got {value}")))
}

/// Accepts a list of edges or one comma separated string.
fn to_edges(value: &Value) -> Result<Vec<String>, PolicyError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| to_str(item).map(str::to_string))
            .collect(),
        Value::String(raw) => Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|edge| !edge.is_empty())
            .map(str::to_string)
            .collect()),
        other => Err(PolicyError::InvalidValue(format!(
            "expected list of role edges, got {other}"
        ))),
    }
}
