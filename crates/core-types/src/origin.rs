//! Hierarchical origin algebra.
//!
//! An origin is either `""` (the local namespace) or `@part1.part2...partN`.
//! Origin `@a.b.c` sits below `@a.b`, `@a` and `""`. The functions in this
//! module are total over arbitrary strings; syntax is only enforced by
//! [`validate_origin`], which entity and selector constructors call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationResult};

/// Display name of the local origin.
pub const DEFAULT_ORIGIN_NAME: &str = "default";
pub const ORIGIN_MAX_LEN: usize = 64;
/// Regex fragment for a non-empty origin, shared with the query validator.
pub const ORIGIN_PATTERN: &str = r"@[a-z0-9]+(?:\.[a-z0-9]+)*";

static ORIGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{ORIGIN_PATTERN}$")).expect("origin regex"));

/// Maps a missing origin or the literal `"default"` to the local origin `""`.
pub fn normalize(origin: Option<&str>) -> String {
    match origin {
        None | Some(DEFAULT_ORIGIN_NAME) => String::new(),
        Some(origin) => origin.to_string(),
    }
}

pub fn display_name(origin: &str) -> &str {
    if origin.is_empty() {
        DEFAULT_ORIGIN_NAME
    } else {
        origin
    }
}

/// Nests `remote` under `local`: `concat("@a", "@b") == "@a.b"`.
pub fn concat(local: &str, remote: &str) -> String {
    if local.is_empty() {
        return remote.to_string();
    }
    if remote.is_empty() {
        return local.to_string();
    }
    let remote = remote.strip_prefix('@').unwrap_or(remote);
    format!("{local}.{remote}")
}

pub fn parts(origin: &str) -> Vec<&str> {
    if origin.is_empty() {
        return vec![""];
    }
    origin
        .strip_prefix('@')
        .unwrap_or(origin)
        .split('.')
        .collect()
}

pub fn parent_of(origin: &str) -> &str {
    match origin.rfind('.') {
        Some(idx) => &origin[..idx],
        None => "",
    }
}

/// Inverse of [`parts`]. Blank parts are dropped; all-blank input is local.
pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> String {
    let kept: Vec<&str> = parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.trim().is_empty())
        .collect();
    if kept.is_empty() {
        String::new()
    } else {
        format!("@{}", kept.join("."))
    }
}

pub fn is_sub_origin_of(ancestor: &str, origin: &str) -> bool {
    if ancestor.is_empty() || origin == ancestor {
        return true;
    }
    origin
        .strip_prefix(ancestor)
        .map(|rest| rest.starts_with('.'))
        .unwrap_or(false)
}

/// `[origin, parent, grandparent, ..., ""]`.
pub fn hierarchy(origin: &str) -> Vec<String> {
    let mut result = vec![origin.to_string()];
    let mut current = origin;
    while !current.is_empty() {
        current = parent_of(current);
        result.push(current.to_string());
    }
    result
}

pub fn is_local(origin: &str, local_origin: &str) -> bool {
    origin == local_origin
}

pub fn validate_origin(origin: &str) -> ValidationResult<()> {
    if origin.is_empty() {
        return Ok(());
    }
    if origin.len() > ORIGIN_MAX_LEN {
        return Err(ValidationError::TooLong {
            kind: "origin",
            len: origin.len(),
            max: ORIGIN_MAX_LEN,
        });
    }
    if !ORIGIN_RE.is_match(origin) {
        return Err(ValidationError::malformed("origin", origin));
    }
    Ok(())
}
