//! Tag selectors and the two-level tag query language.
//!
//! ```text
//! selector   = ["!"] ( tag? ("@" origin_body / "@*") / tag )
//! andgroup   = selector *([":"/"&"] selector)
//! query      = andgroup *([" "/"|"] andgroup)
//! ```
//!
//! A raw query first passes the regex gate in [`validate`], then the split
//! based parser in [`query`] builds the OR-of-AND structure. Parentheses are
//! not part of the language.

pub mod errors;
pub mod query;
pub mod selector;
pub mod validate;

pub use errors::{TagQueryError, TagQueryResult};
pub use query::TagQuery;
pub use selector::{OriginPattern, Selector};
pub use validate::{
    validate_query, validate_search, validate_search_with_limit, QUERY_MAX_LEN, SEARCH_MAX_LEN,
};
