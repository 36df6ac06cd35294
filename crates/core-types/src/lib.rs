//! Shared primitives for the refgate crates.
//!
//! Everything here is pure data plus total functions over strings: the origin
//! algebra, tag syntax and classification, the role vocabulary and the record
//! shapes the authorization engine reasons about.

pub mod errors;
pub mod model;
pub mod origin;
pub mod role;
pub mod tag;

pub use errors::{ValidationError, ValidationResult};
pub use model::{Ref, TagEntity, TagEntityKind, Tagged, User};
pub use role::Role;
pub use tag::{QualifiedTag, TagVisibility};
