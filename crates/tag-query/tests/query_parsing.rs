use pretty_assertions::assert_eq;
use refgate_tag_query::{OriginPattern, Selector, TagQuery, TagQueryError, QUERY_MAX_LEN};

#[test]
fn or_of_and_structure_from_mixed_delimiters() {
    let query: TagQuery = "news&!_draft science|@remote.node".parse().unwrap();

    let flat: Vec<_> = query.or_terms().iter().map(Selector::to_string).collect();
    assert_eq!(flat, vec!["science", "@remote.node"]);

    let groups: Vec<Vec<String>> = query
        .and_groups()
        .iter()
        .map(|group| group.iter().map(Selector::to_string).collect())
        .collect();
    assert_eq!(groups, vec![vec!["news".to_string(), "!_draft".to_string()]]);
}

#[test]
fn origin_only_and_wildcard_selectors_stay_distinct() {
    let query = TagQuery::parse("@*|@remote").unwrap();
    let origins: Vec<_> = query.or_terms().iter().map(|s| s.origin().clone()).collect();
    assert_eq!(
        origins,
        vec![OriginPattern::Any, OriginPattern::Exact("@remote".into())]
    );
    assert!(query.or_terms().iter().all(|s| s.tag().is_none()));
}

#[test]
fn length_is_checked_before_grammar() {
    let oversized = format!("{}(", "a".repeat(QUERY_MAX_LEN));
    match TagQuery::parse(&oversized) {
        Err(TagQueryError::Validation(err)) => assert_eq!(err.kind(), "query"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn many_doubled_or_delimiters_parse_to_flat_terms() {
    let raw = vec!["t"; 500].join("||");
    let query = TagQuery::parse(&raw).unwrap();
    assert_eq!(query.or_terms().len(), 500);
    assert!(query.and_groups().is_empty());
}

#[test]
fn serializes_structure() {
    let query = TagQuery::parse("a:b|c@*").unwrap();
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["raw"], "a:b|c@*");
    assert_eq!(json["or_terms"][0]["tag"], "c");
    assert_eq!(json["or_terms"][0]["origin"]["kind"], "any");
    assert_eq!(json["and_groups"][0][1]["tag"], "b");
}
