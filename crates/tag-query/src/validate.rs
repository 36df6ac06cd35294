//! Fast-reject gate run before any parsing.
//!
//! The `regex` crate matches in linear time, so inputs such as `a||b` that
//! make backtracking engines blow up are accepted or rejected in bounded time.
//! Passing the gate does not mean the query is well formed: empty selectors
//! such as `!` are still caught by the parser.

use once_cell::sync::Lazy;
use regex::Regex;
use refgate_core_types::origin::ORIGIN_PATTERN;
use refgate_core_types::tag::TAG_PATTERN;
use refgate_core_types::{ValidationError, ValidationResult};

pub const QUERY_MAX_LEN: usize = 4096;
pub const SEARCH_MAX_LEN: usize = 512;

fn selector_pattern() -> String {
    format!(r"!?(?:{TAG_PATTERN})?(?:@\*|{ORIGIN_PATTERN})?")
}

static SELECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", selector_pattern())).expect("selector regex"));

static QUERY_RE: Lazy<Regex> = Lazy::new(|| {
    let selector = selector_pattern();
    Regex::new(&format!("^{selector}(?:[ |:&]+{selector})*$")).expect("query regex")
});

pub fn validate_query(raw: &str, max_len: usize) -> ValidationResult<()> {
    if raw.len() > max_len {
        return Err(ValidationError::TooLong {
            kind: "query",
            len: raw.len(),
            max: max_len,
        });
    }
    if !QUERY_RE.is_match(raw) {
        return Err(ValidationError::malformed("query", raw));
    }
    Ok(())
}

pub fn validate_selector(raw: &str) -> ValidationResult<()> {
    if !SELECTOR_RE.is_match(raw) {
        return Err(ValidationError::malformed("selector", raw));
    }
    Ok(())
}

/// Free-text search is only length limited.
pub fn validate_search(text: &str) -> ValidationResult<()> {
    validate_search_with_limit(text, SEARCH_MAX_LEN)
}

pub fn validate_search_with_limit(text: &str, max_len: usize) -> ValidationResult<()> {
    let len = text.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong {
            kind: "search",
            len,
            max: max_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_query_shapes() {
        for ok in [
            "",
            "a",
            "a|b",
            "a b",
            "a:b|c",
            "a&b c",
            "!_secret:public",
            "science@remote.node",
            "@*",
            "@remote",
            "tag@*|other",
            "a||b",
            "a::b",
        ] {
            assert!(validate_query(ok, QUERY_MAX_LEN).is_ok(), "{ok} rejected");
        }
    }

    #[test]
    fn rejects_malformed_queries() {
        for bad in ["(a|b)", "A", "a,b", "a@", "a@*x", "a!b", "a@b@c", "a\tb"] {
            assert!(validate_query(bad, QUERY_MAX_LEN).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn doubled_delimiters_stay_fast() {
        let raw = format!("{}!", "a||".repeat(1300));
        let started = std::time::Instant::now();
        assert!(validate_query(&raw, QUERY_MAX_LEN).is_ok());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn enforces_length_limits() {
        let long = "a".repeat(QUERY_MAX_LEN + 1);
        assert!(matches!(
            validate_query(&long, QUERY_MAX_LEN),
            Err(ValidationError::TooLong { kind: "query", .. })
        ));
        assert!(validate_search(&"x".repeat(SEARCH_MAX_LEN)).is_ok());
        assert!(validate_search(&"x".repeat(SEARCH_MAX_LEN + 1)).is_err());
        assert!(validate_search_with_limit("ééé", 3).is_ok());
    }

    #[test]
    fn selector_gate() {
        assert!(validate_selector("!tag1@origin1").is_ok());
        assert!(validate_selector("tag1|tag2").is_err());
    }
}
