use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use once_cell::sync::Lazy;
use refgate_core_types::Role;
use serde::Serialize;

use crate::defaults::DEFAULT_ROLE_CHAIN;
use crate::errors::PolicyError;

static DEFAULT_HIERARCHY: Lazy<RoleHierarchy> = Lazy::new(|| {
    RoleHierarchy::from_edges(&[DEFAULT_ROLE_CHAIN]).expect("default role hierarchy")
});

/// Transitive closure of the role implication graph.
///
/// Built once from `"HIGHER > LOWER"` edges and read-only afterwards, so
/// checks are plain set lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleHierarchy {
    implied: BTreeMap<Role, BTreeSet<Role>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl RoleHierarchy {
    pub fn from_edges<S: AsRef<str>>(lines: &[S]) -> Result<Self, PolicyError> {
        let mut edges: BTreeMap<Role, BTreeSet<Role>> = BTreeMap::new();
        for line in lines {
            let chain = line
                .as_ref()
                .split('>')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    name.parse::<Role>()
                        .map_err(|_| PolicyError::UnknownRole(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            for pair in chain.windows(2) {
                if pair[0] == pair[1] {
                    return Err(PolicyError::HierarchyCycle(pair[0]));
                }
                edges.entry(pair[0]).or_default().insert(pair[1]);
            }
        }

        let mut marks = BTreeMap::new();
        let mut implied = BTreeMap::new();
        for role in edges.keys().copied().collect::<Vec<_>>() {
            close(role, &edges, &mut marks, &mut implied)?;
        }
        Ok(Self { implied })
    }

    /// Every role `role` implies, itself included.
    pub fn implied_by(&self, role: Role) -> BTreeSet<Role> {
        let mut set = self.implied.get(&role).cloned().unwrap_or_default();
        set.insert(role);
        set
    }

    pub fn expand<I: IntoIterator<Item = Role>>(&self, granted: I) -> RoleSet {
        let mut roles = BTreeSet::new();
        for role in granted {
            roles.extend(self.implied_by(role));
        }
        RoleSet(roles)
    }

    pub fn implies(&self, higher: Role, lower: Role) -> bool {
        higher == lower
            || self
                .implied
                .get(&higher)
                .map_or(false, |set| set.contains(&lower))
    }
}

fn close(
    role: Role,
    edges: &BTreeMap<Role, BTreeSet<Role>>,
    marks: &mut BTreeMap<Role, Mark>,
    implied: &mut BTreeMap<Role, BTreeSet<Role>>,
) -> Result<BTreeSet<Role>, PolicyError> {
    match marks.get(&role) {
        Some(Mark::Done) => return Ok(implied.get(&role).cloned().unwrap_or_default()),
        Some(Mark::Visiting) => return Err(PolicyError::HierarchyCycle(role)),
        None => {}
    }
    marks.insert(role, Mark::Visiting);
    let mut reach = BTreeSet::new();
    for &lower in edges.get(&role).into_iter().flatten() {
        reach.insert(lower);
        reach.extend(close(lower, edges, marks, implied)?);
    }
    marks.insert(role, Mark::Done);
    implied.insert(role, reach.clone());
    Ok(reach)
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        DEFAULT_HIERARCHY.clone()
    }
}

/// A principal's roles after hierarchy expansion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn has(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_chain_is_transitive() {
        let hierarchy = RoleHierarchy::default();
        assert!(hierarchy.implies(Role::Admin, Role::User));
        assert!(hierarchy.implies(Role::Sysadmin, Role::Anonymous));
        assert!(hierarchy.implies(Role::Mod, Role::Editor));
        assert!(!hierarchy.implies(Role::User, Role::Mod));
        assert!(!hierarchy.implies(Role::Admin, Role::Private));
    }

    #[test]
    fn expansion_keeps_orthogonal_roles() {
        let roles = RoleHierarchy::default().expand([Role::User, Role::Private]);
        assert!(roles.has(Role::Private));
        assert!(roles.has(Role::Viewer));
        assert!(!roles.has(Role::Editor));
        assert_eq!(roles.to_string(), "USER,VIEWER,ANONYMOUS,PRIVATE");
    }

    #[test]
    fn accepts_separate_edges() {
        let hierarchy =
            RoleHierarchy::from_edges(&["ADMIN > MOD", "MOD > USER", "ROLE_USER > viewer"])
                .unwrap();
        assert!(hierarchy.implies(Role::Admin, Role::Viewer));
        assert!(!hierarchy.implies(Role::Sysadmin, Role::Admin));
    }

    #[test]
    fn rejects_cycles_and_unknown_roles() {
        assert!(matches!(
            RoleHierarchy::from_edges(&["ADMIN > MOD", "MOD > ADMIN"]),
            Err(PolicyError::HierarchyCycle(_))
        ));
        assert!(matches!(
            RoleHierarchy::from_edges(&["USER > USER"]),
            Err(PolicyError::HierarchyCycle(Role::User))
        ));
        assert!(matches!(
            RoleHierarchy::from_edges(&["ADMIN > ROOT"]),
            Err(PolicyError::UnknownRole(name)) if name == "ROOT"
        ));
    }
}
