//! Command-line front end for the refgate crates.
//!
//! The binary wires [`refgate_policy_center`] configuration loading to a
//! small set of subcommands for inspecting origins, compiling tag queries
//! and replaying authorization decisions against a store fixture.

pub mod cli;

pub use refgate_core_types as core_types;
pub use refgate_policy_center as policy_center;
pub use refgate_spec_compiler as spec_compiler;
pub use refgate_tag_query as tag_query;
