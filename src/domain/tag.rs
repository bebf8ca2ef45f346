//! Tag Entity
//!
//! A tag belongs to a job, may carry a free-text type, and has a
//! translatable name and slug. Position is maintained by the sortable
//! operations of the repository.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::slug::slugify;
use super::translations::{TranslatableValue, Translations};

/// Fields stored per locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatableField {
    Name,
    Slug,
}

impl TranslatableField {
    pub fn column(&self) -> &'static str {
        match self {
            TranslatableField::Name => "name",
            TranslatableField::Slug => "slug",
        }
    }
}

/// A localized, job-scoped tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier, 0 until persisted
    pub id: u32,
    job_id: i64,
    /// Optional classifier such as "category" or "keyword"
    #[serde(rename = "type")]
    pub tag_type: Option<String>,
    name: Translations,
    slug: Translations,
    /// Sort position, maintained by the repository
    pub order_column: i32,
}

/// Attributes for bulk construction
#[derive(Debug, Clone)]
pub struct NewTag {
    pub job_id: i64,
    pub name: TranslatableValue,
    pub tag_type: Option<String>,
    pub slug: Option<TranslatableValue>,
}

impl NewTag {
    pub fn new(job_id: i64, name: impl Into<TranslatableValue>) -> Self {
        Self {
            job_id,
            name: name.into(),
            tag_type: None,
            slug: None,
        }
    }

    pub fn with_type(mut self, tag_type: impl Into<String>) -> Self {
        self.tag_type = Some(tag_type.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<TranslatableValue>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

impl Tag {
    pub const TRANSLATABLE: [TranslatableField; 2] =
        [TranslatableField::Name, TranslatableField::Slug];

    /// Create an unsaved tag named `name` in `locale`
    pub fn new(job_id: i64, name: &str, tag_type: Option<&str>, locale: &str) -> Self {
        let mut tag = Self::empty(job_id, tag_type.map(str::to_string));
        tag.set_name(locale, name);
        tag
    }

    /// Build an unsaved tag from attributes, resolving scalar translatable
    /// values against `locale`
    pub fn from_attributes(attrs: NewTag, locale: &str) -> Self {
        let mut tag = Self::empty(attrs.job_id, attrs.tag_type);
        tag.set_translation(TranslatableField::Name, locale, attrs.name);
        if let Some(slug) = attrs.slug {
            tag.set_translation(TranslatableField::Slug, locale, slug);
        }
        tag
    }

    /// Rebuild a persisted tag from storage
    pub(crate) fn from_parts(
        id: u32,
        job_id: i64,
        tag_type: Option<String>,
        name: Translations,
        slug: Translations,
        order_column: i32,
    ) -> Self {
        Self {
            id,
            job_id,
            tag_type,
            name,
            slug,
            order_column,
        }
    }

    fn empty(job_id: i64, tag_type: Option<String>) -> Self {
        Self {
            id: 0,
            job_id,
            tag_type,
            name: Translations::new(),
            slug: Translations::new(),
            order_column: 0,
        }
    }

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn name(&self) -> &Translations {
        &self.name
    }

    pub fn slug(&self) -> &Translations {
        &self.slug
    }

    pub fn name_in(&self, locale: &str) -> Option<&str> {
        self.name.get(locale)
    }

    pub fn slug_in(&self, locale: &str) -> Option<&str> {
        self.slug.get(locale)
    }

    pub fn translations(&self, field: TranslatableField) -> &Translations {
        match field {
            TranslatableField::Name => &self.name,
            TranslatableField::Slug => &self.slug,
        }
    }

    /// Assign a translatable field.
    ///
    /// A `Single` value only touches `locale`; a `Map` replaces every
    /// locale. Names drive slugs: each changed name locale gets a fresh
    /// slug.
    pub fn set_translation(
        &mut self,
        field: TranslatableField,
        locale: &str,
        value: TranslatableValue,
    ) {
        match (field, value) {
            (TranslatableField::Name, TranslatableValue::Single(value)) => {
                self.set_name(locale, &value)
            }
            (TranslatableField::Name, TranslatableValue::Map(map)) => self.set_names(map),
            (TranslatableField::Slug, TranslatableValue::Single(value)) => {
                self.slug.set(locale, value)
            }
            (TranslatableField::Slug, TranslatableValue::Map(map)) => self.slug = map,
        }
    }

    /// Set the name for one locale and regenerate its slug
    pub fn set_name(&mut self, locale: &str, name: &str) {
        self.name.set(locale, name);
        self.regenerate_slug(locale);
    }

    /// Replace every name translation and regenerate all slugs
    pub fn set_names(&mut self, names: Translations) {
        self.name = names;
        self.slug = Translations::new();
        let locales: Vec<String> = self.name.locales().map(str::to_string).collect();
        for locale in locales {
            self.regenerate_slug(&locale);
        }
    }

    /// Override the slug for one locale
    pub fn set_slug(&mut self, locale: &str, slug: &str) {
        self.slug.set(locale, slug);
    }

    /// Drop one locale from both name and slug
    pub fn forget_translation(&mut self, locale: &str) {
        self.name.forget(locale);
        self.slug.forget(locale);
    }

    fn regenerate_slug(&mut self, locale: &str) {
        let generated = self.name.get(locale).map(slugify).unwrap_or_default();
        if generated.is_empty() {
            self.slug.forget(locale);
        } else {
            self.slug.set(locale, generated);
        }
    }
}

impl Entity for Tag {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Input to find-or-create: a name to resolve, or an already resolved tag
#[derive(Debug, Clone)]
pub enum TagInput {
    Name(String),
    Existing(Tag),
}

impl From<&str> for TagInput {
    fn from(name: &str) -> Self {
        TagInput::Name(name.to_string())
    }
}

impl From<String> for TagInput {
    fn from(name: String) -> Self {
        TagInput::Name(name)
    }
}

impl From<Tag> for TagInput {
    fn from(tag: Tag) -> Self {
        TagInput::Existing(tag)
    }
}
