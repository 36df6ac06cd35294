use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::errors::TagQueryResult;
use crate::selector::Selector;
use crate::validate::{validate_query, QUERY_MAX_LEN};

fn is_or_delimiter(c: char) -> bool {
    matches!(c, ' ' | '|')
}

fn is_and_delimiter(c: char) -> bool {
    matches!(c, ':' | '&')
}

/// Parsed OR-of-AND tag query.
///
/// `or_terms` are single selectors OR'd together; every entry of
/// `and_groups` holds two or more selectors that must all hold, and each
/// group is itself one more alternative of the outer OR.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagQuery {
    raw: String,
    or_terms: Vec<Selector>,
    and_groups: Vec<Vec<Selector>>,
}

impl TagQuery {
    pub fn parse(raw: &str) -> TagQueryResult<Self> {
        Self::parse_with_limit(raw, QUERY_MAX_LEN)
    }

    /// Validates against `max_len` and the query grammar, then splits.
    ///
    /// Empty alternatives produced by doubled delimiters (`a||b`, `a::b`)
    /// are skipped.
    pub fn parse_with_limit(raw: &str, max_len: usize) -> TagQueryResult<Self> {
        let raw = raw.trim();
        validate_query(raw, max_len)?;

        let mut or_terms = Vec::new();
        let mut and_groups = Vec::new();
        for group in raw.split(is_or_delimiter) {
            let mut selectors = group
                .split(is_and_delimiter)
                .filter(|part| !part.is_empty())
                .map(Selector::parse)
                .collect::<TagQueryResult<Vec<_>>>()?;
            match selectors.len() {
                0 => continue,
                1 => or_terms.extend(selectors.pop()),
                _ => and_groups.push(selectors),
            }
        }

        trace!(
            target: "tag-query",
            query = raw,
            or_terms = or_terms.len(),
            and_groups = and_groups.len(),
            "parsed tag query"
        );
        Ok(Self {
            raw: raw.to_string(),
            or_terms,
            and_groups,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn or_terms(&self) -> &[Selector] {
        &self.or_terms
    }

    pub fn and_groups(&self) -> &[Vec<Selector>] {
        &self.and_groups
    }

    pub fn is_empty(&self) -> bool {
        self.or_terms.is_empty() && self.and_groups.is_empty()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.or_terms.iter().chain(self.and_groups.iter().flatten())
    }

    /// Every tag the query names, negated or not.
    pub fn tags(&self) -> BTreeSet<&str> {
        self.selectors().filter_map(Selector::tag).collect()
    }

    /// Evaluates the query against one record.
    ///
    /// An empty query matches everything, as does its compiled form.
    pub fn matches<S: AsRef<str>>(&self, origin: &str, tags: &[S]) -> bool {
        if self.is_empty() {
            return true;
        }
        let holds = |selector: &Selector| selector.holds(origin, tags);
        self.or_terms.iter().any(holds)
            || self
                .and_groups
                .iter()
                .any(|group| group.iter().all(holds))
    }
}

impl fmt::Display for TagQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for group in &self.and_groups {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            let joined = group
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(":");
            f.write_str(&joined)?;
        }
        for term in &self.or_terms {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for TagQuery {
    type Err = crate::errors::TagQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TagQuery::parse(raw)
    }
}
