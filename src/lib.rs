//! Polytag
//!
//! Localized, job-scoped, sortable tags stored in SQLite.
//!
//! Layered architecture:
//! - domain: Tag entity, translations, locales and errors
//! - repository: Data access traits and the SQLite implementation

pub mod config;
pub mod domain;
pub mod repository;

pub use config::TagConfig;
pub use domain::{
    DomainError, DomainResult, Entity, Locale, NewTag, Tag, TagInput, TranslatableField,
    TranslatableValue, Translations,
};
pub use repository::{
    init_db, DbState, Repository, SearchableRepository, TagLookupOperations, TagQuery,
    TagRepository, TagSortableOperations,
};

/// Open the configured database and return a repository bound to the
/// configured locale
pub async fn open(config: &TagConfig) -> DomainResult<TagRepository> {
    let state = init_db(&config.database_path).await?;
    Ok(TagRepository::new(state.connection(), config.locale.clone()))
}
