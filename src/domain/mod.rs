//! Domain Layer
//!
//! Contains the tag entity and its supporting value types.
//! This layer performs no I/O.

mod entity;
mod locale;
mod slug;
mod tag;
mod translations;

pub use entity::{DomainError, DomainResult, Entity};
pub use locale::Locale;
pub use slug::slugify;
pub(crate) use slug::slug_candidates;
pub use tag::{NewTag, Tag, TagInput, TranslatableField};
pub use translations::{TranslatableValue, Translations};
