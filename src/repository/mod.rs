//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod db;
pub mod tag;
mod traits;

#[cfg(test)]
mod tests;

pub use db::{init_db, DbState, SharedConnection};
pub use tag::{TagLookupOperations, TagQuery, TagRepository, TagSortableOperations};
pub use traits::{Repository, SearchableRepository};
