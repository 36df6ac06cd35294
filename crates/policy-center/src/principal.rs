use refgate_core_types::tag::{private_tag, public_tag};
use refgate_core_types::Role;
use serde::{Deserialize, Serialize};

/// The authenticated caller of one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User tag, with or without a visibility prefix. `None` when anonymous.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub origin: String,
    /// Roles as granted; the engine expands them through the hierarchy.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            origin: String::new(),
            roles: vec![Role::Anonymous],
        }
    }

    pub fn new(user: impl Into<String>, origin: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user: Some(user.into()),
            origin: origin.into(),
            roles,
        }
    }

    /// Renders the user tag `_user/x` when `private`, else bare `user/x`.
    pub fn user_tag(&self, private: bool) -> Option<String> {
        self.user.as_deref().map(|tag| {
            if private {
                private_tag(tag)
            } else {
                public_tag(tag).to_string()
            }
        })
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_tag_rendering() {
        let alice = Principal::new("+user/alice", "", vec![Role::User]);
        assert_eq!(alice.user_tag(false).as_deref(), Some("user/alice"));
        assert_eq!(alice.user_tag(true).as_deref(), Some("_user/alice"));
        assert_eq!(Principal::anonymous().user_tag(true), None);
    }
}
