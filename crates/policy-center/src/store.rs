//! Read-only lookups the engine needs from storage.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use refgate_core_types::{Ref, TagEntity, User};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PolicyError;
use crate::loader::parse_config_str;

/// Synchronous lookup contract. Both keys are origin qualified: the same url
/// replicated from two origins is two records.
pub trait AuthStore {
    fn lookup_existing_ref(&self, url: &str, origin: &str) -> Option<Ref>;
    fn lookup_user(&self, tag: &str, origin: &str) -> Option<User>;
}

impl<T: AuthStore + ?Sized> AuthStore for &T {
    fn lookup_existing_ref(&self, url: &str, origin: &str) -> Option<Ref> {
        (**self).lookup_existing_ref(url, origin)
    }

    fn lookup_user(&self, tag: &str, origin: &str) -> Option<User> {
        (**self).lookup_user(tag, origin)
    }
}

/// Store contents as written in a fixture file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub refs: Vec<Ref>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub entities: Vec<TagEntity>,
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    refs: HashMap<(String, String), Ref>,
    users: HashMap<(String, String), User>,
    entities: Vec<TagEntity>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ref(&mut self, record: Ref) {
        self.refs
            .insert((record.url.clone(), record.origin.clone()), record);
    }

    pub fn insert_user(&mut self, user: User) {
        self.users
            .insert((user.tag.clone(), user.origin.clone()), user);
    }

    pub fn insert_entity(&mut self, entity: TagEntity) {
        self.entities.push(entity);
    }

    pub fn with_ref(mut self, record: Ref) -> Self {
        self.insert_ref(record);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.insert_user(user);
        self
    }

    pub fn refs(&self) -> impl Iterator<Item = &Ref> {
        self.refs.values()
    }

    pub fn entities(&self) -> &[TagEntity] {
        &self.entities
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        let mut store = Self::new();
        for record in fixture.refs {
            store.insert_ref(record);
        }
        for user in fixture.users {
            store.insert_user(user);
        }
        store.entities = fixture.entities;
        store
    }

    /// Parses a JSON or YAML fixture.
    pub fn from_fixture_str(raw: &str) -> Result<Self, PolicyError> {
        let value = parse_config_str(raw)?;
        let fixture: StoreFixture =
            serde_json::from_value(value).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
        let store = Self::from_fixture_str(&raw)?;
        debug!(
            target: "policy-center",
            path = %path.display(),
            refs = store.refs.len(),
            users = store.users.len(),
            "loaded store fixture"
        );
        Ok(store)
    }
}

impl AuthStore for InMemoryStore {
    fn lookup_existing_ref(&self, url: &str, origin: &str) -> Option<Ref> {
        self.refs
            .get(&(url.to_string(), origin.to_string()))
            .cloned()
    }

    fn lookup_user(&self, tag: &str, origin: &str) -> Option<User> {
        self.users
            .get(&(tag.to_string(), origin.to_string()))
            .cloned()
    }
}
