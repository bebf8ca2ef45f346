//! Tag Repository Module
//!
//! This module provides tag repository functionality split into specialized sub-modules:
//! - tag_repo: Core CRUD operations
//! - tag_query: Composable query scopes
//! - tag_lookup: Find / find-or-create by name
//! - tag_positioning: Sortable position management

mod tag_lookup;
mod tag_positioning;
mod tag_query;
mod tag_repo;

pub use tag_query::TagQuery;
pub use tag_repo::TagRepository;

// Re-export all operation traits so they can be used by importing TagRepository
pub use tag_lookup::TagLookupOperations;
pub use tag_positioning::TagSortableOperations;
