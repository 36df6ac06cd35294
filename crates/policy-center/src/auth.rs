//! Request-scoped authorization decisions.
//!
//! [`AuthEngine`] is built once at startup from [`AuthConfig`] and shared
//! read-only. Each request gets its own [`AuthContext`] holding the caller's
//! expanded roles and a lazily fetched copy of their user record. Decisions
//! are plain booleans; only unparseable query input is an error.

use once_cell::unsync::OnceCell;
use refgate_core_types::tag::{is_private_tag, is_public_tag, LOCKED_TAG, PUBLIC_TAG};
use refgate_core_types::{Ref, Role, TagEntity, User, ValidationResult};
use refgate_spec_compiler::Specification;
use refgate_tag_query::{validate_search_with_limit, TagQuery, TagQueryResult};
use tracing::debug;

use crate::errors::PolicyResult;
use crate::hierarchy::{RoleHierarchy, RoleSet};
use crate::model::AuthConfig;
use crate::principal::Principal;
use crate::store::AuthStore;

/// Entries of `incoming` absent from `existing`; a missing record counts as empty.
pub fn new_tags(incoming: &[String], existing: Option<&[String]>) -> Vec<String> {
    let existing = existing.unwrap_or(&[]);
    let mut added: Vec<String> = Vec::new();
    for tag in incoming {
        if !existing.contains(tag) && !added.contains(tag) {
            added.push(tag.clone());
        }
    }
    added
}

#[derive(Clone, Debug)]
pub struct AuthEngine {
    config: AuthConfig,
    hierarchy: RoleHierarchy,
}

impl AuthEngine {
    pub fn new(config: AuthConfig) -> PolicyResult<Self> {
        let hierarchy = RoleHierarchy::from_edges(&config.role_hierarchy)?;
        Ok(Self { config, hierarchy })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn local_origin(&self) -> &str {
        &self.config.local_origin
    }

    pub fn parse_query(&self, raw: &str) -> TagQueryResult<TagQuery> {
        TagQuery::parse_with_limit(raw, self.config.max_query_len)
    }

    pub fn validate_search(&self, text: &str) -> ValidationResult<()> {
        validate_search_with_limit(text, self.config.max_search_len)
    }

    pub fn context<'a, S: AuthStore + ?Sized>(
        &'a self,
        store: &'a S,
        principal: Principal,
    ) -> AuthContext<'a, S> {
        let roles = self.hierarchy.expand(principal.roles.iter().copied());
        let user_tag = principal.user_tag(roles.has(Role::Private));
        debug!(
            target: "policy-center",
            user = user_tag.as_deref().unwrap_or("-"),
            roles = %roles,
            "auth context created"
        );
        AuthContext {
            engine: self,
            store,
            principal,
            roles,
            user_tag,
            user: OnceCell::new(),
        }
    }
}

impl Default for AuthEngine {
    fn default() -> Self {
        Self {
            config: AuthConfig::default(),
            hierarchy: RoleHierarchy::default(),
        }
    }
}

/// One request's view of the caller. Not shared across requests.
pub struct AuthContext<'a, S: AuthStore + ?Sized> {
    engine: &'a AuthEngine,
    store: &'a S,
    principal: Principal,
    roles: RoleSet,
    user_tag: Option<String>,
    user: OnceCell<Option<User>>,
}

impl<'a, S: AuthStore + ?Sized> AuthContext<'a, S> {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.has(role)
    }

    /// The caller's own tag, rendered private when they hold `PRIVATE`.
    pub fn user_tag(&self) -> Option<&str> {
        self.user_tag.as_deref()
    }

    /// Fetched on first use, then cached for the rest of the request.
    pub fn user(&self) -> Option<&User> {
        self.user
            .get_or_init(|| {
                let tag = self.user_tag.as_deref()?;
                self.store.lookup_user(tag, &self.principal.origin)
            })
            .as_ref()
    }

    pub fn read_access(&self) -> &[String] {
        self.user()
            .map(|user| user.read_access.as_slice())
            .unwrap_or(&[])
    }

    pub fn write_access(&self) -> &[String] {
        self.user()
            .map(|user| user.write_access.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_local(&self, origin: &str) -> bool {
        origin == self.engine.local_origin()
    }

    fn is_own_tag(&self, tag: &str) -> bool {
        self.user_tag() == Some(tag)
    }

    fn owns_any(&self, tags: &[String]) -> bool {
        self.user_tag
            .as_ref()
            .map_or(false, |own| tags.contains(own))
    }

    fn deny(&self, op: &'static str, subject: &str) -> bool {
        debug!(
            target: "policy-center",
            op,
            subject,
            user = self.user_tag().unwrap_or("-"),
            "access denied"
        );
        false
    }

    pub fn can_read_ref(&self, record: &Ref) -> bool {
        if !self.is_local(&record.origin) {
            return true;
        }
        if self.has_role(Role::Mod) {
            return true;
        }
        if record.has_tag(PUBLIC_TAG) {
            return true;
        }
        if self.has_role(Role::User)
            && (self.owns_any(&record.tags)
                || record.tags.iter().any(|tag| self.read_access().contains(tag)))
        {
            return true;
        }
        self.deny("read_ref", &record.url)
    }

    /// Ownership test against the stored record, then the newTags check.
    pub fn can_write_ref(&self, record: &Ref) -> bool {
        let existing = self.store.lookup_existing_ref(&record.url, &record.origin);
        if !self.can_write_existing(&record.url, existing.as_ref()) {
            return false;
        }
        let added = new_tags(&record.tags, existing.as_ref().map(|e| e.tags.as_slice()));
        match added.iter().find(|tag| !self.can_read_tag(tag)) {
            Some(tag) => self.deny("write_ref.new_tag", tag),
            None => true,
        }
    }

    /// Ownership by existing state only. A url with no stored record is
    /// writable so deletes stay idempotent.
    pub fn can_write_ref_url(&self, url: &str, origin: &str) -> bool {
        let existing = self.store.lookup_existing_ref(url, origin);
        self.can_write_existing(url, existing.as_ref())
    }

    fn can_write_existing(&self, url: &str, existing: Option<&Ref>) -> bool {
        if self.has_role(Role::Admin) {
            return true;
        }
        let Some(existing) = existing else {
            return true;
        };
        if existing.has_tag(LOCKED_TAG) && !self.has_role(Role::Mod) {
            return self.deny("write_ref.locked", url);
        }
        if self.has_role(Role::Mod) {
            return true;
        }
        if self.has_role(Role::User)
            && (self.owns_any(&existing.tags)
                || existing
                    .tags
                    .iter()
                    .any(|tag| self.write_access().contains(tag)))
        {
            return true;
        }
        self.deny("write_ref", url)
    }

    pub fn can_read_tag(&self, tag: &str) -> bool {
        if !is_private_tag(tag) {
            return true;
        }
        if self.has_role(Role::Mod) {
            return true;
        }
        if self.has_role(Role::User)
            && (self.is_own_tag(tag) || self.read_access().iter().any(|t| t == tag))
        {
            return true;
        }
        self.deny("read_tag", tag)
    }

    pub fn can_write_tag(&self, tag: &str) -> bool {
        if self.has_role(Role::Mod) {
            return true;
        }
        if self.has_role(Role::User)
            && (self.is_own_tag(tag) || self.write_access().iter().any(|t| t == tag))
        {
            return true;
        }
        self.deny("write_tag", tag)
    }

    /// Editors may add public tags without owning them.
    pub fn can_add_tag(&self, tag: &str) -> bool {
        if self.has_role(Role::Editor) && is_public_tag(tag) {
            return true;
        }
        self.can_write_tag(tag)
    }

    /// Adding `tags` to a stored ref the caller can read.
    pub fn can_tag_ref(&self, url: &str, origin: &str, tags: &[String]) -> bool {
        let Some(existing) = self.store.lookup_existing_ref(url, origin) else {
            return self.deny("tag_ref.missing", url);
        };
        self.can_read_ref(&existing) && tags.iter().all(|tag| self.can_add_tag(tag))
    }

    pub fn can_read_user(&self, user: &User) -> bool {
        !self.is_local(&user.origin) || self.can_read_tag(&user.tag)
    }

    /// Access list edits may only grant what the caller already holds.
    pub fn can_write_user(&self, user: &User) -> bool {
        if self.has_role(Role::Mod) {
            return true;
        }
        if !self.can_write_tag(&user.tag) {
            return false;
        }
        let existing = self.store.lookup_user(&user.tag, &user.origin);
        let existing = existing.as_ref();
        new_tags(&user.read_access, existing.map(|u| u.read_access.as_slice()))
            .iter()
            .all(|tag| self.can_write_tag(tag))
            && new_tags(&user.write_access, existing.map(|u| u.write_access.as_slice()))
                .iter()
                .all(|tag| self.can_write_tag(tag))
            && new_tags(
                &user.subscriptions,
                existing.map(|u| u.subscriptions.as_slice()),
            )
            .iter()
            .all(|tag| self.can_read_tag(tag))
    }

    /// Every tag the query names must be readable, negated or not.
    pub fn can_read_query(&self, raw: &str) -> TagQueryResult<bool> {
        let query = self.engine.parse_query(raw)?;
        if self.has_role(Role::Mod) {
            return Ok(true);
        }
        let readable = query.tags().into_iter().all(|tag| self.can_read_tag(tag));
        Ok(readable)
    }

    pub fn can_read_tag_entity(&self, entity: &TagEntity) -> bool {
        !self.is_local(&entity.origin) || self.can_read_tag(&entity.tag)
    }

    /// Only local entities are writable; plugins and templates need `ADMIN`.
    pub fn can_write_tag_entity(&self, entity: &TagEntity) -> bool {
        if !self.is_local(&entity.origin) {
            return self.deny("write_entity.remote", &entity.tag);
        }
        if entity.kind.is_config() && !self.has_role(Role::Admin) {
            return self.deny("write_entity.config", &entity.tag);
        }
        self.can_write_tag(&entity.tag)
    }

    pub fn filter_tags(&self, tags: &[String]) -> Vec<String> {
        if self.has_role(Role::Mod) {
            return tags.to_vec();
        }
        tags.iter()
            .filter(|tag| self.can_read_tag(tag))
            .cloned()
            .collect()
    }

    /// `None` when nothing can be hidden from the caller.
    pub fn hidden_tags(&self, tags: &[String]) -> Option<Vec<String>> {
        if self.has_role(Role::Mod) {
            return None;
        }
        Some(
            tags.iter()
                .filter(|tag| !self.can_read_tag(tag))
                .cloned()
                .collect(),
        )
    }

    /// Bulk read scope for refs.
    pub fn ref_read_spec(&self) -> Specification {
        if self.has_role(Role::Mod) {
            return Specification::True;
        }
        let granted = if self.has_role(Role::User) {
            self.user_tag
                .as_deref()
                .map_or(Specification::False, Specification::has_tag)
                .or(Specification::has_any_tag(self.read_access().iter().cloned()))
        } else {
            Specification::False
        };
        Specification::has_tag(PUBLIC_TAG).or(granted)
    }

    /// Bulk read scope for tag-keyed entities.
    pub fn tag_read_spec(&self) -> Specification {
        if self.has_role(Role::Mod) {
            return Specification::True;
        }
        let granted = if self.has_role(Role::User) {
            self.user_tag
                .as_deref()
                .map_or(Specification::False, Specification::is_tag)
                .or(Specification::is_any_tag(self.read_access().iter().cloned()))
        } else {
            Specification::False
        };
        Specification::IsPublicTag.or(granted)
    }
}
