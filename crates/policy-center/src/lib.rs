//! Origin-aware authorization engine.
//!
//! Configuration ([`AuthConfig`]) is layered from builtin defaults, files,
//! `REFGATE_AUTH__*` environment variables and explicit overrides, then
//! compiled into an [`AuthEngine`]. Per request, [`AuthEngine::context`]
//! yields an [`AuthContext`] answering every read/write question.

pub mod auth;
pub mod defaults;
pub mod errors;
pub mod hierarchy;
pub mod loader;
pub mod model;
pub mod principal;
pub mod store;

pub use auth::{new_tags, AuthContext, AuthEngine};
pub use defaults::default_config;
pub use errors::{PolicyError, PolicyResult};
pub use hierarchy::{RoleHierarchy, RoleSet};
pub use loader::{load_config, load_config_with_options, LoadOptions};
pub use model::{AuthConfig, ConfigProvenance, ConfigSource};
pub use principal::Principal;
pub use store::{AuthStore, InMemoryStore, StoreFixture};

#[cfg(test)]
mod tests;
