use std::path::{Path, PathBuf};
use std::sync::Arc;

use refgate_policy_center::{AuthConfig, AuthEngine};

use super::output::OutputFormat;

pub struct CliContext {
    engine: Arc<AuthEngine>,
    config_path: PathBuf,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(engine: AuthEngine, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            engine: Arc::new(engine),
            config_path,
            output,
        }
    }

    pub fn engine(&self) -> &AuthEngine {
        self.engine.as_ref()
    }

    pub fn config(&self) -> &AuthConfig {
        self.engine.config()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}
