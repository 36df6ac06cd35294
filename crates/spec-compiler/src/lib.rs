//! Compiles selectors and tag queries into [`Specification`] predicate trees.
//!
//! The tree is the contract with storage: backends translate it into their
//! native filter, and the auth engine evaluates it in memory with
//! [`Specification::matches`]. Both readings must agree.

pub mod compile;
pub mod spec;

pub use compile::{
    compile_filter, compile_query, compile_query_str, compile_selector, compile_selector_str,
    EntityKind,
};
pub use spec::Specification;
