use refgate_tag_query::{OriginPattern, Selector, TagQuery, TagQueryResult};
use serde::Serialize;
use tracing::trace;

use crate::spec::Specification;

/// Which tag clause a selector's tag compiles to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Entities with a tag list: `HasTag`.
    Ref,
    /// Entities identified by their own tag: `IsTag`.
    TagKeyed,
}

impl EntityKind {
    fn tag_clause(self, tag: &str) -> Specification {
        match self {
            EntityKind::Ref => Specification::has_tag(tag),
            EntityKind::TagKeyed => Specification::is_tag(tag),
        }
    }

    fn any_tag_clause(self, tags: Vec<&str>) -> Specification {
        match self {
            EntityKind::Ref => Specification::has_any_tag(tags),
            EntityKind::TagKeyed => Specification::is_any_tag(tags),
        }
    }
}

/// `maybe_not(tag_clause AND origin_clause)`.
///
/// A selector without `@` adds no origin clause, so `science` filters on the
/// tag alone wherever the entity was replicated from.
pub fn compile_selector(selector: &Selector, kind: EntityKind) -> Specification {
    let tag_clause = selector
        .tag()
        .map_or(Specification::True, |tag| kind.tag_clause(tag));
    let origin_clause = match selector.origin() {
        OriginPattern::Exact(origin) => Specification::is_origin(origin.as_str()),
        OriginPattern::Local | OriginPattern::Any => Specification::True,
    };
    tag_clause.and(origin_clause).maybe_not(selector.is_negated())
}

/// Compiles the OR-of-AND structure. An empty query compiles to `True`.
pub fn compile_query(query: &TagQuery, kind: EntityKind) -> Specification {
    if query.is_empty() {
        return Specification::True;
    }

    let groups = query.and_groups().iter().map(|group| {
        if kind == EntityKind::Ref && group.iter().all(Selector::is_plain) {
            Specification::has_all_tags(group.iter().filter_map(Selector::tag))
        } else {
            Specification::all(group.iter().map(|s| compile_selector(s, kind)))
        }
    });
    let mut spec = Specification::any(groups);

    let (plain, qualified): (Vec<&Selector>, Vec<&Selector>) =
        query.or_terms().iter().partition(|s| s.is_plain());
    spec = spec.or(kind.any_tag_clause(plain.iter().filter_map(|s| s.tag()).collect()));
    for selector in qualified {
        spec = spec.or(compile_selector(selector, kind));
    }

    trace!(target: "tag-query", query = query.raw(), spec = %spec, "compiled tag query");
    spec
}

pub fn compile_selector_str(raw: &str, kind: EntityKind) -> TagQueryResult<Specification> {
    Ok(compile_selector(&Selector::parse(raw)?, kind))
}

pub fn compile_query_str(raw: &str, kind: EntityKind) -> TagQueryResult<Specification> {
    Ok(compile_query(&TagQuery::parse(raw)?, kind))
}

/// Compiles an optional request filter.
///
/// A missing or blank query yields `on_empty`: list endpoints pass `True`
/// (no filtering) while endpoints where "no query" means "no results" pass
/// `False`.
pub fn compile_filter(
    raw: Option<&str>,
    kind: EntityKind,
    on_empty: Specification,
) -> TagQueryResult<Specification> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(on_empty);
    };
    let query = TagQuery::parse(raw)?;
    if query.is_empty() {
        return Ok(on_empty);
    }
    Ok(compile_query(&query, kind))
}
