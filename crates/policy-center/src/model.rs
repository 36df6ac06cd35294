use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node-wide authorization settings, loaded once at startup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Origin this node serves. Records from any other origin are replicas.
    pub local_origin: String,
    /// `"HIGHER > LOWER"` edges; a line may chain several roles.
    pub role_hierarchy: Vec<String>,
    pub max_query_len: usize,
    pub max_search_len: usize,
    #[serde(skip_deserializing)]
    pub provenance: BTreeMap<String, ConfigProvenance>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        crate::defaults::default_config()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigProvenance {
    pub path: String,
    pub source: ConfigSource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Builtin,
    File,
    Env,
    Cli,
}

impl AuthConfig {
    pub fn set_provenance(&mut self, path: &str, source: ConfigSource) {
        self.provenance.insert(
            path.to_string(),
            ConfigProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<ConfigSource> {
        self.provenance.get(path).map(|entry| entry.source)
    }
}
