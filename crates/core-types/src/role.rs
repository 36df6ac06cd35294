use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Roles a principal can be granted.
///
/// Implication between roles (`ADMIN` implies `MOD`, ...) is not encoded
/// here; the policy center expands granted roles through its hierarchy table.
/// `PRIVATE` is a modifier rather than a rank: it selects whether the
/// principal's own user tag is rendered private.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "UPPERCASE"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Sysadmin,
    Admin,
    Mod,
    Editor,
    User,
    Viewer,
    Anonymous,
    Private,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Sysadmin,
        Role::Admin,
        Role::Mod,
        Role::Editor,
        Role::User,
        Role::Viewer,
        Role::Anonymous,
        Role::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Sysadmin => "SYSADMIN",
            Role::Admin => "ADMIN",
            Role::Mod => "MOD",
            Role::Editor => "EDITOR",
            Role::User => "USER",
            Role::Viewer => "VIEWER",
            Role::Anonymous => "ANONYMOUS",
            Role::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `ADMIN`, `admin` and the Spring-style `ROLE_ADMIN`.
impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == name)
            .ok_or_else(|| ValidationError::malformed("role", raw))
    }
}
