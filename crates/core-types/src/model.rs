//! Records the authorization engine reasons about.
//!
//! Only the fields that take part in access decisions are modelled; the
//! storage layer owns the full documents.

/// Read-only view of what a predicate can test on an entity.
///
/// Refs carry a list of tags. Tag-keyed entities (users, extensions,
/// plugins, templates, queues) are identified by a single tag of their own.
pub trait Tagged {
    fn tags(&self) -> &[String];
    fn origin(&self) -> &str;
    fn own_tag(&self) -> Option<&str> {
        None
    }
}

/// A tagged record addressed by url within an origin.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ref {
    pub url: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub origin: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub tags: Vec<String>,
}

impl Ref {
    pub fn new(url: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Tagged for Ref {
    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    pub tag: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub origin: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub read_access: Vec<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub write_access: Vec<String>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub subscriptions: Vec<String>,
}

impl User {
    pub fn new(tag: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }
}

impl Tagged for User {
    fn tags(&self) -> &[String] {
        &[]
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn own_tag(&self) -> Option<&str> {
        Some(&self.tag)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagEntityKind {
    Ext,
    Plugin,
    Template,
    Queue,
}

impl TagEntityKind {
    /// Plugins and templates configure the node itself.
    pub fn is_config(&self) -> bool {
        matches!(self, TagEntityKind::Plugin | TagEntityKind::Template)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagEntityKind::Ext => "ext",
            TagEntityKind::Plugin => "plugin",
            TagEntityKind::Template => "template",
            TagEntityKind::Queue => "queue",
        }
    }
}

/// Any record keyed by a single tag: extensions, plugins, templates, queues.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntity {
    pub kind: TagEntityKind,
    pub tag: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub origin: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub name: Option<String>,
}

impl TagEntity {
    pub fn new(kind: TagEntityKind, tag: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            origin: origin.into(),
            name: None,
        }
    }
}

impl Tagged for TagEntity {
    fn tags(&self) -> &[String] {
        &[]
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn own_tag(&self) -> Option<&str> {
        Some(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_builder_sets_tags() {
        let r = Ref::new("https://example.com", "@remote").with_tags(["public", "science"]);
        assert!(r.has_tag("science"));
        assert!(!r.has_tag("_secret"));
        assert_eq!(Tagged::origin(&r), "@remote");
        assert_eq!(r.own_tag(), None);
    }

    #[test]
    fn tag_keyed_entities_expose_own_tag() {
        let user = User::new("+user/alice", "");
        assert_eq!(user.own_tag(), Some("+user/alice"));
        assert!(user.tags().is_empty());

        let plugin = TagEntity::new(TagEntityKind::Plugin, "+plugin/feed", "");
        assert_eq!(plugin.own_tag(), Some("+plugin/feed"));
        assert!(plugin.kind.is_config());
        assert!(!TagEntityKind::Queue.is_config());
    }
}
