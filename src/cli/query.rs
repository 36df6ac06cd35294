use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use refgate_core_types::origin::{normalize, validate_origin};
use refgate_core_types::Ref;
use refgate_spec_compiler::{compile_query, EntityKind, Specification};
use refgate_tag_query::TagQuery;
use serde::Serialize;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub action: QueryAction,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    /// Entities carrying a tag list
    Ref,
    /// Entities identified by a single tag
    Tag,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ref => EntityKind::Ref,
            KindArg::Tag => EntityKind::TagKeyed,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum QueryAction {
    /// Parse a query and print its canonical form
    Parse { query: String },

    /// Compile a query into a predicate
    Compile {
        query: String,

        #[arg(long, value_enum, default_value = "ref")]
        kind: KindArg,

        /// Match nothing when the query is blank instead of everything
        #[arg(long)]
        empty_matches_none: bool,
    },

    /// Evaluate a query against a single tagged record
    Match {
        query: String,

        /// Comma separated tags on the record
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long, default_value = "")]
        origin: String,
    },

    /// Validate free-text search input
    Search { text: String },
}

#[derive(Serialize)]
struct ParseReport<'a> {
    canonical: String,
    query: &'a TagQuery,
    tags: Vec<&'a str>,
}

#[derive(Serialize)]
struct MatchReport {
    predicate: String,
    matches: bool,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    text: &'a str,
    valid: bool,
}

pub fn cmd_query(args: QueryArgs, ctx: &CliContext) -> Result<()> {
    let output = ctx.output();
    match args.action {
        QueryAction::Parse { query } => {
            let parsed = ctx.engine().parse_query(&query)?;
            let report = ParseReport {
                canonical: parsed.to_string(),
                tags: parsed.tags().into_iter().collect(),
                query: &parsed,
            };
            output.print(&report, |r| r.canonical.clone())
        }
        QueryAction::Compile {
            query,
            kind,
            empty_matches_none,
        } => {
            let on_empty = if empty_matches_none {
                Specification::False
            } else {
                Specification::True
            };
            let spec = compile(ctx, &query, kind.into(), on_empty)?;
            output.print(&spec, |spec| spec.to_string())
        }
        QueryAction::Match {
            query,
            tags,
            origin,
        } => {
            let origin = normalize(Some(origin.trim()));
            validate_origin(&origin)?;
            let tags: Vec<String> = tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            let spec = compile(ctx, &query, EntityKind::Ref, Specification::True)?;
            let record = Ref::new("", origin).with_tags(tags);
            let report = MatchReport {
                predicate: spec.to_string(),
                matches: spec.matches(&record),
            };
            output.print(&report, |r| r.matches.to_string())
        }
        QueryAction::Search { text } => {
            ctx.engine().validate_search(&text)?;
            let report = SearchReport {
                text: &text,
                valid: true,
            };
            output.print(&report, |_| "valid".to_string())
        }
    }
}

fn compile(
    ctx: &CliContext,
    raw: &str,
    kind: EntityKind,
    on_empty: Specification,
) -> Result<Specification> {
    if raw.trim().is_empty() {
        return Ok(on_empty);
    }
    let query = ctx.engine().parse_query(raw)?;
    if query.is_empty() {
        return Ok(on_empty);
    }
    Ok(compile_query(&query, kind))
}
