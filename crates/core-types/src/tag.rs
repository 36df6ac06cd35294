//! Tag syntax and visibility classes.
//!
//! A leading `_` makes a tag private, a leading `+` marks a protected
//! (machine-managed) tag, anything else is public.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationResult};
use crate::origin::validate_origin;

pub const TAG_MAX_LEN: usize = 64;
/// Regex fragment for a tag, shared with the query validator.
pub const TAG_PATTERN: &str = r"[_+]?[a-z0-9]+(?:[./][a-z0-9]+)*";

/// Tag that makes a record readable by everyone.
pub const PUBLIC_TAG: &str = "public";
/// Tag that freezes a record for everyone below `MOD`.
pub const LOCKED_TAG: &str = "locked";

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{TAG_PATTERN}$")).expect("tag regex"));

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagVisibility {
    Public,
    Private,
    Protected,
}

impl TagVisibility {
    pub fn of(tag: &str) -> Self {
        if tag.starts_with('_') {
            Self::Private
        } else if tag.starts_with('+') {
            Self::Protected
        } else {
            Self::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
        }
    }
}

pub fn is_private_tag(tag: &str) -> bool {
    tag.starts_with('_')
}

pub fn is_protected_tag(tag: &str) -> bool {
    tag.starts_with('+')
}

/// True only for unprefixed tags.
pub fn is_public_tag(tag: &str) -> bool {
    TagVisibility::of(tag) == TagVisibility::Public
}

/// Strips one visibility prefix: `_user/alice` -> `user/alice`.
pub fn public_tag(tag: &str) -> &str {
    tag.strip_prefix('_')
        .or_else(|| tag.strip_prefix('+'))
        .unwrap_or(tag)
}

pub fn private_tag(tag: &str) -> String {
    format!("_{}", public_tag(tag))
}

pub fn protected_tag(tag: &str) -> String {
    format!("+{}", public_tag(tag))
}

pub fn validate_tag(tag: &str) -> ValidationResult<()> {
    if tag.len() > TAG_MAX_LEN {
        return Err(ValidationError::TooLong {
            kind: "tag",
            len: tag.len(),
            max: TAG_MAX_LEN,
        });
    }
    if !TAG_RE.is_match(tag) {
        return Err(ValidationError::malformed("tag", tag));
    }
    Ok(())
}

/// A tag bound to the origin it lives in, written `tag@origin`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedTag {
    pub tag: String,
    pub origin: String,
}

impl QualifiedTag {
    pub fn new(tag: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            origin: origin.into(),
        }
    }

    /// Splits on the first `@`. No syntax checks; see [`QualifiedTag::validate`].
    pub fn parse(raw: &str) -> Self {
        match raw.find('@') {
            Some(at) => Self::new(&raw[..at], &raw[at..]),
            None => Self::new(raw, ""),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_tag(&self.tag)?;
        validate_origin(&self.origin)
    }

    pub fn is_local(&self) -> bool {
        self.origin.is_empty()
    }
}

impl fmt::Display for QualifiedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_classes() {
        assert_eq!(TagVisibility::of("_secret"), TagVisibility::Private);
        assert_eq!(TagVisibility::of("+plugin/feed"), TagVisibility::Protected);
        assert_eq!(TagVisibility::of("science"), TagVisibility::Public);
        assert!(is_public_tag("science"));
        assert!(!is_public_tag("+plugin/feed"));
        assert!(is_protected_tag("+plugin/feed"));
        assert!(is_private_tag("_secret"));
    }

    #[test]
    fn prefix_rewrites() {
        assert_eq!(public_tag("_user/alice"), "user/alice");
        assert_eq!(public_tag("+user/alice"), "user/alice");
        assert_eq!(public_tag("user/alice"), "user/alice");
        assert_eq!(private_tag("+user/alice"), "_user/alice");
        assert_eq!(protected_tag("user/alice"), "+user/alice");
    }

    #[test]
    fn tag_syntax() {
        for ok in ["a", "_a", "+a", "a/b", "a.b/c9", "plugin/feed.rss"] {
            assert!(validate_tag(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "A", "_", "a/", "a//b", "-a", "a b", "__a", "a@b"] {
            assert!(validate_tag(bad).is_err(), "{bad} should be rejected");
        }
        assert!(matches!(
            validate_tag(&"a".repeat(TAG_MAX_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn qualified_tag_parse_and_display() {
        let qt = QualifiedTag::parse("science@remote.node");
        assert_eq!(qt.tag, "science");
        assert_eq!(qt.origin, "@remote.node");
        assert_eq!(qt.to_string(), "science@remote.node");
        assert!(qt.validate().is_ok());

        let local = QualifiedTag::parse("science");
        assert!(local.is_local());
        assert_eq!(local.to_string(), "science");
    }
}
