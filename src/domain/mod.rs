//! Domain models for intake
//!
//! Contains the planned-item model and placeholder resolution without any I/O
//! concerns.

mod entry;
mod outcome;
mod reference;
mod resolver;

pub use entry::{Entry, ItemKind};
pub use outcome::{count_created, Outcome};
pub use reference::{PlaceholderConvention, Reference, ReferenceError, DEFAULT_PLACEHOLDER_PREFIX};
pub use resolver::{DirectKeyPolicy, DuplicatePolicy, IdResolver, ResolveError};
