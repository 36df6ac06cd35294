use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use refgate_core_types::origin::{normalize, validate_origin};
use refgate_core_types::tag::validate_tag;
use refgate_core_types::{Ref, Role, TagEntity, TagEntityKind, User};
use refgate_policy_center::{AuthContext, AuthStore, InMemoryStore, Principal};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::cli::context::CliContext;
use crate::cli::output::OutputFormat;
use crate::cli::query::KindArg;

#[derive(Args, Clone, Debug)]
pub struct AuthArgs {
    /// Store fixture (JSON or YAML) with refs, users and entities
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Caller's user tag; omit for an anonymous caller
    #[arg(long)]
    pub user: Option<String>,

    /// Granted role, repeatable (ADMIN, ROLE_USER, private, ...)
    #[arg(long = "role", value_delimiter = ',')]
    pub roles: Vec<Role>,

    /// Origin the caller authenticated against
    #[arg(long, default_value = "")]
    pub user_origin: String,

    #[command(subcommand)]
    pub action: AuthAction,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EntityKindArg {
    Ext,
    Plugin,
    Template,
    Queue,
}

impl From<EntityKindArg> for TagEntityKind {
    fn from(kind: EntityKindArg) -> Self {
        match kind {
            EntityKindArg::Ext => TagEntityKind::Ext,
            EntityKindArg::Plugin => TagEntityKind::Plugin,
            EntityKindArg::Template => TagEntityKind::Template,
            EntityKindArg::Queue => TagEntityKind::Queue,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum AuthAction {
    /// Print read/write decisions for every record in the fixture
    Check,

    /// Can the caller read a stored ref
    ReadRef {
        url: String,
        #[arg(long, default_value = "")]
        origin: String,
    },

    /// Can the caller write a ref, optionally replacing its tags
    WriteRef {
        url: String,
        #[arg(long, default_value = "")]
        origin: String,
        /// Proposed tag list; omit to check ownership only
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Can the caller add tags to a stored ref
    TagRef {
        url: String,
        #[arg(long, default_value = "")]
        origin: String,
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<String>,
    },

    ReadTag { tag: String },

    WriteTag { tag: String },

    AddTag { tag: String },

    /// Split tags into visible and hidden for the caller
    Filter {
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Can the caller run a tag query
    ReadQuery { query: String },

    ReadUser {
        tag: String,
        #[arg(long, default_value = "")]
        origin: String,
    },

    /// Can the caller save a user record with the given access lists
    WriteUser {
        tag: String,
        #[arg(long, default_value = "")]
        origin: String,
        #[arg(long, value_delimiter = ',')]
        read_access: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        write_access: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        subscriptions: Option<Vec<String>>,
    },

    ReadEntity {
        #[arg(value_enum)]
        kind: EntityKindArg,
        tag: String,
        #[arg(long, default_value = "")]
        origin: String,
    },

    WriteEntity {
        #[arg(value_enum)]
        kind: EntityKindArg,
        tag: String,
        #[arg(long, default_value = "")]
        origin: String,
    },

    /// Print the predicate scoping bulk reads for the caller
    ReadSpec {
        #[arg(long, value_enum, default_value = "ref")]
        kind: KindArg,
    },
}

#[derive(Serialize)]
struct Decision {
    op: &'static str,
    subject: String,
    allowed: bool,
}

impl Decision {
    fn new(op: &'static str, subject: impl Into<String>, allowed: bool) -> Self {
        Self {
            op,
            subject: subject.into(),
            allowed,
        }
    }

    fn verdict(&self) -> &'static str {
        if self.allowed {
            "allow"
        } else {
            "deny"
        }
    }
}

#[derive(Serialize)]
struct TableRow {
    kind: &'static str,
    subject: String,
    origin: String,
    read: bool,
    write: bool,
}

#[derive(Serialize)]
struct FilterReport {
    visible: Vec<String>,
    hidden: Option<Vec<String>>,
}

pub async fn cmd_auth(args: AuthArgs, ctx: &CliContext) -> Result<()> {
    let store = load_store(args.fixture.as_deref()).await?;
    let principal = build_principal(args.user, args.roles, &args.user_origin)?;
    info!(
        user = principal.user.as_deref().unwrap_or("-"),
        roles = ?principal.roles,
        "evaluating as principal"
    );
    let auth = ctx.engine().context(&store, principal);
    debug!(roles = %auth.roles(), "expanded roles");
    let output = ctx.output();

    match args.action {
        AuthAction::Check => print_table(output, &auth, &store),
        AuthAction::ReadRef { url, origin } => {
            let origin = parse_origin(&origin)?;
            let record = store
                .lookup_existing_ref(&url, &origin)
                .with_context(|| format!("no ref {} in fixture", url))?;
            print_decision(output, Decision::new("read_ref", url, auth.can_read_ref(&record)))
        }
        AuthAction::WriteRef { url, origin, tags } => {
            let origin = parse_origin(&origin)?;
            let allowed = match tags {
                Some(tags) => {
                    let tags = clean_tags(tags)?;
                    auth.can_write_ref(&Ref::new(url.as_str(), origin).with_tags(tags))
                }
                None => auth.can_write_ref_url(&url, &origin),
            };
            print_decision(output, Decision::new("write_ref", url, allowed))
        }
        AuthAction::TagRef { url, origin, tags } => {
            let origin = parse_origin(&origin)?;
            let tags = clean_tags(tags)?;
            let allowed = auth.can_tag_ref(&url, &origin, &tags);
            print_decision(output, Decision::new("tag_ref", url, allowed))
        }
        AuthAction::ReadTag { tag } => {
            validate_tag(&tag)?;
            let allowed = auth.can_read_tag(&tag);
            print_decision(output, Decision::new("read_tag", tag, allowed))
        }
        AuthAction::WriteTag { tag } => {
            validate_tag(&tag)?;
            let allowed = auth.can_write_tag(&tag);
            print_decision(output, Decision::new("write_tag", tag, allowed))
        }
        AuthAction::AddTag { tag } => {
            validate_tag(&tag)?;
            let allowed = auth.can_add_tag(&tag);
            print_decision(output, Decision::new("add_tag", tag, allowed))
        }
        AuthAction::Filter { tags } => {
            let tags = clean_tags(tags)?;
            let report = FilterReport {
                visible: auth.filter_tags(&tags),
                hidden: auth.hidden_tags(&tags),
            };
            output.print(&report, |r| {
                let hidden = match &r.hidden {
                    Some(hidden) => hidden.join(" "),
                    None => "(none hidden)".to_string(),
                };
                format!("visible: {}\nhidden: {}", r.visible.join(" "), hidden)
            })
        }
        AuthAction::ReadQuery { query } => {
            let allowed = auth.can_read_query(&query)?;
            print_decision(output, Decision::new("read_query", query, allowed))
        }
        AuthAction::ReadUser { tag, origin } => {
            let origin = parse_origin(&origin)?;
            let user = store
                .lookup_user(&tag, &origin)
                .unwrap_or_else(|| User::new(tag.as_str(), origin));
            print_decision(output, Decision::new("read_user", tag, auth.can_read_user(&user)))
        }
        AuthAction::WriteUser {
            tag,
            origin,
            read_access,
            write_access,
            subscriptions,
        } => {
            let origin = parse_origin(&origin)?;
            let mut user = store
                .lookup_user(&tag, &origin)
                .unwrap_or_else(|| User::new(tag.as_str(), origin));
            if let Some(tags) = read_access {
                user.read_access = clean_tags(tags)?;
            }
            if let Some(tags) = write_access {
                user.write_access = clean_tags(tags)?;
            }
            if let Some(tags) = subscriptions {
                user.subscriptions = clean_tags(tags)?;
            }
            let allowed = auth.can_write_user(&user);
            print_decision(output, Decision::new("write_user", tag, allowed))
        }
        AuthAction::ReadEntity { kind, tag, origin } => {
            let entity = TagEntity::new(kind.into(), tag.as_str(), parse_origin(&origin)?);
            let allowed = auth.can_read_tag_entity(&entity);
            print_decision(output, Decision::new("read_entity", tag, allowed))
        }
        AuthAction::WriteEntity { kind, tag, origin } => {
            let entity = TagEntity::new(kind.into(), tag.as_str(), parse_origin(&origin)?);
            let allowed = auth.can_write_tag_entity(&entity);
            print_decision(output, Decision::new("write_entity", tag, allowed))
        }
        AuthAction::ReadSpec { kind } => {
            let spec = match kind {
                KindArg::Ref => auth.ref_read_spec(),
                KindArg::Tag => auth.tag_read_spec(),
            };
            output.print(&spec, |spec| spec.to_string())
        }
    }
}

async fn load_store(path: Option<&Path>) -> Result<InMemoryStore> {
    let Some(path) = path else {
        debug!("no fixture given, using an empty store");
        return Ok(InMemoryStore::new());
    };
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    InMemoryStore::from_fixture_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn build_principal(user: Option<String>, roles: Vec<Role>, origin: &str) -> Result<Principal> {
    let origin = parse_origin(origin)?;
    let principal = match user {
        Some(user) => {
            validate_tag(&user)?;
            let roles = if roles.is_empty() {
                vec![Role::User]
            } else {
                roles
            };
            Principal::new(user, origin, roles)
        }
        None => {
            let mut principal = Principal::anonymous();
            principal.origin = origin;
            if !roles.is_empty() {
                principal.roles = roles;
            }
            principal
        }
    };
    Ok(principal)
}

fn parse_origin(raw: &str) -> Result<String> {
    let origin = normalize(Some(raw.trim()));
    validate_origin(&origin)?;
    Ok(origin)
}

fn clean_tags(tags: Vec<String>) -> Result<Vec<String>> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            validate_tag(&tag)?;
            Ok::<_, anyhow::Error>(tag)
        })
        .collect()
}

fn print_decision(output: OutputFormat, decision: Decision) -> Result<()> {
    output.print(&decision, |d| d.verdict().to_string())
}

fn print_table<S: AuthStore + ?Sized>(
    output: OutputFormat,
    auth: &AuthContext<'_, S>,
    store: &InMemoryStore,
) -> Result<()> {
    let mut refs: Vec<&Ref> = store.refs().collect();
    refs.sort_by(|a, b| (&a.origin, &a.url).cmp(&(&b.origin, &b.url)));

    let mut rows: Vec<TableRow> = refs
        .into_iter()
        .map(|record| TableRow {
            kind: "ref",
            subject: record.url.clone(),
            origin: record.origin.clone(),
            read: auth.can_read_ref(record),
            write: auth.can_write_ref_url(&record.url, &record.origin),
        })
        .collect();
    rows.extend(store.entities().iter().map(|entity| TableRow {
        kind: entity.kind.as_str(),
        subject: entity.tag.clone(),
        origin: entity.origin.clone(),
        read: auth.can_read_tag_entity(entity),
        write: auth.can_write_tag_entity(entity),
    }));

    output.print(&rows, |rows| {
        let mut lines = vec![format!(
            "{:<8} {:<32} {:<12} {:<5} {:<5}",
            "KIND", "SUBJECT", "ORIGIN", "READ", "WRITE"
        )];
        for row in rows {
            lines.push(format!(
                "{:<8} {:<32} {:<12} {:<5} {:<5}",
                row.kind,
                row.subject,
                refgate_core_types::origin::display_name(&row.origin),
                row.read,
                row.write
            ));
        }
        lines.join("\n")
    })
}
