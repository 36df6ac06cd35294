use std::fmt;

use refgate_core_types::tag::is_private_tag;
use refgate_core_types::Tagged;
use serde::Serialize;

/// Predicate tree handed to storage and evaluated in memory by the auth engine.
///
/// Build trees through the combinators ([`Specification::and`],
/// [`Specification::or`], [`Specification::not`]) and the collection
/// constructors; they fold constants and collapse single-element sets so the
/// same query always yields the same, minimal tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Specification {
    True,
    False,
    And(Box<Specification>, Box<Specification>),
    Or(Box<Specification>, Box<Specification>),
    Not(Box<Specification>),
    /// Ref carries the tag.
    HasTag(String),
    HasAnyTag(Vec<String>),
    HasAllTags(Vec<String>),
    /// Tag-keyed entity is identified by the tag.
    IsTag(String),
    IsAnyTag(Vec<String>),
    /// Tag-keyed entity's own tag is not private.
    IsPublicTag,
    IsOrigin(String),
    IsAnyOrigin(Vec<String>),
}

fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl Specification {
    pub fn has_tag(tag: impl Into<String>) -> Self {
        Self::HasTag(tag.into())
    }

    pub fn is_tag(tag: impl Into<String>) -> Self {
        Self::IsTag(tag.into())
    }

    pub fn is_origin(origin: impl Into<String>) -> Self {
        Self::IsOrigin(origin.into())
    }

    /// Empty set matches nothing.
    pub fn has_any_tag<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags = dedup(tags);
        match tags.len() {
            0 => Self::False,
            1 => Self::HasTag(tags.remove(0)),
            _ => Self::HasAnyTag(tags),
        }
    }

    /// Empty set is vacuously true.
    pub fn has_all_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags = dedup(tags);
        match tags.len() {
            0 => Self::True,
            1 => Self::HasTag(tags.remove(0)),
            _ => Self::HasAllTags(tags),
        }
    }

    pub fn is_any_tag<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags = dedup(tags);
        match tags.len() {
            0 => Self::False,
            1 => Self::IsTag(tags.remove(0)),
            _ => Self::IsAnyTag(tags),
        }
    }

    /// A filter naming zero origins matches nothing.
    pub fn is_any_origin<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut origins = dedup(origins);
        match origins.len() {
            0 => Self::False,
            1 => Self::IsOrigin(origins.remove(0)),
            _ => Self::IsAnyOrigin(origins),
        }
    }

    pub fn and(self, other: Specification) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, other) | (other, Self::True) => other,
            (left, right) => Self::And(Box::new(left), Box::new(right)),
        }
    }

    pub fn or(self, other: Specification) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, other) | (other, Self::False) => other,
            (left, right) => Self::Or(Box::new(left), Box::new(right)),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    pub fn maybe_not(self, negate: bool) -> Self {
        if negate {
            self.not()
        } else {
            self
        }
    }

    /// Left fold with [`Specification::and`] starting from `True`.
    pub fn all<I: IntoIterator<Item = Specification>>(specs: I) -> Self {
        specs.into_iter().fold(Self::True, Self::and)
    }

    /// Left fold with [`Specification::or`] starting from `False`.
    pub fn any<I: IntoIterator<Item = Specification>>(specs: I) -> Self {
        specs.into_iter().fold(Self::False, Self::or)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    /// In-memory evaluation against an entity already fetched.
    pub fn matches<T: Tagged + ?Sized>(&self, entity: &T) -> bool {
        let has = |tag: &String| entity.tags().iter().any(|t| t == tag);
        let own = entity.own_tag();
        match self {
            Self::True => true,
            Self::False => false,
            Self::And(left, right) => left.matches(entity) && right.matches(entity),
            Self::Or(left, right) => left.matches(entity) || right.matches(entity),
            Self::Not(inner) => !inner.matches(entity),
            Self::HasTag(tag) => has(tag),
            Self::HasAnyTag(tags) => tags.iter().any(has),
            Self::HasAllTags(tags) => tags.iter().all(has),
            Self::IsTag(tag) => own == Some(tag.as_str()),
            Self::IsAnyTag(tags) => own.map_or(false, |own| tags.iter().any(|t| t == own)),
            Self::IsPublicTag => own.map_or(false, |own| !is_private_tag(own)),
            Self::IsOrigin(origin) => entity.origin() == origin,
            Self::IsAnyOrigin(origins) => origins.iter().any(|o| o == entity.origin()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, items: &[String]) -> fmt::Result {
    write!(f, "{name}([{}])", items.join(", "))
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("True"),
            Self::False => f.write_str("False"),
            Self::And(left, right) => write!(f, "And({left}, {right})"),
            Self::Or(left, right) => write!(f, "Or({left}, {right})"),
            Self::Not(inner) => write!(f, "Not({inner})"),
            Self::HasTag(tag) => write!(f, "HasTag({tag})"),
            Self::HasAnyTag(tags) => write_list(f, "HasAnyTag", tags),
            Self::HasAllTags(tags) => write_list(f, "HasAllTags", tags),
            Self::IsTag(tag) => write!(f, "IsTag({tag})"),
            Self::IsAnyTag(tags) => write_list(f, "IsAnyTag", tags),
            Self::IsPublicTag => f.write_str("IsPublicTag"),
            Self::IsOrigin(origin) => write!(f, "IsOrigin({origin:?})"),
            Self::IsAnyOrigin(origins) => {
                let quoted: Vec<String> = origins.iter().map(|o| format!("{o:?}")).collect();
                write_list(f, "IsAnyOrigin", &quoted)
            }
        }
    }
}
