use clap::Subcommand;

use super::auth::AuthArgs;
use super::config::ConfigArgs;
use super::origin::OriginArgs;
use super::query::QueryArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Origin algebra: hierarchy, parts, parents, containment
    Origin(OriginArgs),

    /// Parse, compile and evaluate tag queries
    Query(QueryArgs),

    /// Evaluate authorization decisions against a store fixture
    Auth(AuthArgs),

    /// Inspect the effective auth configuration
    Config(ConfigArgs),

    /// Show build and configuration summary
    Info,
}
