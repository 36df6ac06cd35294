use anyhow::Result;
use clap::{Args, Subcommand};
use refgate_core_types::origin::{self, display_name, normalize, validate_origin};
use serde::Serialize;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct OriginArgs {
    #[command(subcommand)]
    pub action: OriginAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum OriginAction {
    /// List an origin and all of its ancestors, nearest first
    Hierarchy { origin: String },

    /// Split an origin into its dotted parts
    Parts { origin: String },

    /// Print the immediate parent origin
    Parent { origin: String },

    /// Check whether ORIGIN sits at or below ANCESTOR
    Contains { ancestor: String, origin: String },

    /// Nest REMOTE under LOCAL
    Concat { local: String, remote: String },

    /// Normalize and validate an origin
    Check { origin: String },
}

#[derive(Serialize)]
struct ContainsReport<'a> {
    ancestor: &'a str,
    origin: &'a str,
    contains: bool,
}

#[derive(Serialize)]
struct CheckReport {
    origin: String,
    display: String,
    local: bool,
}

fn parse_origin(raw: &str) -> Result<String> {
    let origin = normalize(Some(raw.trim()));
    validate_origin(&origin)?;
    Ok(origin)
}

pub fn cmd_origin(args: OriginArgs, ctx: &CliContext) -> Result<()> {
    let output = ctx.output();
    match args.action {
        OriginAction::Hierarchy { origin } => {
            let origin = parse_origin(&origin)?;
            let chain = origin::hierarchy(&origin);
            output.print(&chain, |chain| {
                chain
                    .iter()
                    .map(|o| display_name(o).to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        OriginAction::Parts { origin } => {
            let origin = parse_origin(&origin)?;
            let parts = origin::parts(&origin);
            output.print(&parts, |parts| parts.join("\n"))
        }
        OriginAction::Parent { origin } => {
            let origin = parse_origin(&origin)?;
            let parent = origin::parent_of(&origin);
            output.print(parent, |parent| display_name(parent).to_string())
        }
        OriginAction::Contains { ancestor, origin } => {
            let ancestor = parse_origin(&ancestor)?;
            let origin = parse_origin(&origin)?;
            let report = ContainsReport {
                ancestor: &ancestor,
                origin: &origin,
                contains: origin::is_sub_origin_of(&ancestor, &origin),
            };
            output.print(&report, |r| r.contains.to_string())
        }
        OriginAction::Concat { local, remote } => {
            let local = parse_origin(&local)?;
            let remote = parse_origin(&remote)?;
            let joined = origin::concat(&local, &remote);
            validate_origin(&joined)?;
            output.print(&joined, |joined| display_name(joined).to_string())
        }
        OriginAction::Check { origin } => {
            let origin = parse_origin(&origin)?;
            let report = CheckReport {
                display: display_name(&origin).to_string(),
                local: origin::is_local(&origin, ctx.engine().local_origin()),
                origin,
            };
            output.print(&report, |r| {
                format!("{} (local: {})", r.display, r.local)
            })
        }
    }
}
