use std::fmt;

use refgate_core_types::origin::validate_origin;
use refgate_core_types::tag::validate_tag;
use serde::Serialize;

use crate::errors::{TagQueryError, TagQueryResult};

/// Origin half of a selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "origin", rename_all = "snake_case")]
pub enum OriginPattern {
    /// No `@` was written.
    Local,
    /// `@origin`.
    Exact(String),
    /// `@*`.
    Any,
}

impl OriginPattern {
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Local => origin.is_empty(),
            OriginPattern::Exact(expected) => expected == origin,
            OriginPattern::Any => true,
        }
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPattern::Local => Ok(()),
            OriginPattern::Exact(origin) => f.write_str(origin),
            OriginPattern::Any => f.write_str("@*"),
        }
    }
}

/// One `!?tag?@origin` pattern tested against a qualified tag.
///
/// `tag: None` matches any tag. A selector with neither a tag nor an origin
/// cannot be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Selector {
    negated: bool,
    tag: Option<String>,
    origin: OriginPattern,
}

impl Selector {
    pub fn new(
        negated: bool,
        tag: Option<String>,
        origin: OriginPattern,
    ) -> TagQueryResult<Self> {
        let selector = Self {
            negated,
            tag: tag.filter(|t| !t.is_empty()),
            origin,
        };
        if selector.tag.is_none() && selector.origin == OriginPattern::Local {
            return Err(TagQueryError::malformed(
                &selector.to_string(),
                "selector needs a tag or an origin",
            ));
        }
        if let Some(tag) = &selector.tag {
            validate_tag(tag)?;
        }
        if let OriginPattern::Exact(origin) = &selector.origin {
            if origin.is_empty() {
                return Err(TagQueryError::malformed(
                    &selector.to_string(),
                    "empty origin",
                ));
            }
            validate_origin(origin)?;
        }
        Ok(selector)
    }

    /// Parses `!?tag`, `!?tag@origin`, `!?@origin` or `!?tag@*` / `!?@*`.
    pub fn parse(raw: &str) -> TagQueryResult<Self> {
        let (negated, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let Some(at) = body.find('@') else {
            if body.is_empty() {
                return Err(TagQueryError::malformed(raw, "empty tag"));
            }
            return Self::new(negated, Some(body.to_string()), OriginPattern::Local);
        };
        let tag = &body[..at];
        let origin = &body[at..];
        let origin = match origin {
            "@*" => OriginPattern::Any,
            "@" => return Err(TagQueryError::malformed(raw, "empty origin")),
            exact => OriginPattern::Exact(exact.to_string()),
        };
        Self::new(negated, Some(tag.to_string()), origin)
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn origin(&self) -> &OriginPattern {
        &self.origin
    }

    /// A bare, non-negated tag with no origin part, e.g. `science`.
    pub fn is_plain(&self) -> bool {
        !self.negated && self.tag.is_some() && self.origin == OriginPattern::Local
    }

    /// Tests a qualified tag such as `science@remote`.
    pub fn captures(&self, qualified_tag: &str) -> bool {
        let (tag, origin) = match qualified_tag.find('@') {
            Some(at) => (&qualified_tag[..at], &qualified_tag[at..]),
            None => (qualified_tag, ""),
        };
        let tag_matches = self.tag.as_deref().map_or(true, |expected| expected == tag);
        (tag_matches && self.origin.matches(origin)) != self.negated
    }

    /// Tests a whole record: its origin and its tag list.
    ///
    /// Unlike [`Selector::captures`], a selector without `@` places no
    /// constraint on the record's origin, and a tag-less selector holds on
    /// the origin alone.
    pub fn holds<S: AsRef<str>>(&self, origin: &str, tags: &[S]) -> bool {
        let tag_matches = self
            .tag
            .as_deref()
            .map_or(true, |expected| tags.iter().any(|t| t.as_ref() == expected));
        let origin_matches = match &self.origin {
            OriginPattern::Exact(expected) => expected == origin,
            OriginPattern::Local | OriginPattern::Any => true,
        };
        (tag_matches && origin_matches) != self.negated
    }

    pub fn negate(&self) -> Self {
        Self {
            negated: !self.negated,
            ..self.clone()
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        write!(f, "{}", self.origin)
    }
}

impl std::str::FromStr for Selector {
    type Err = TagQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Selector::parse(raw)
    }
}
