pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod origin;
pub mod output;
pub mod query;
pub mod runtime;

pub use app::run;
pub use output::OutputFormat;
