//! Translatable Values
//!
//! A translatable field stores one string per locale. It is persisted as
//! a JSON object keyed by locale code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::DomainResult;

/// Per-locale values of a single field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(BTreeMap<String, String>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding a single locale entry
    pub fn single(locale: impl Into<String>, value: impl Into<String>) -> Self {
        let mut translations = Self::new();
        translations.set(locale, value);
        translations
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    pub fn set(&mut self, locale: impl Into<String>, value: impl Into<String>) {
        self.0.insert(locale.into(), value.into());
    }

    pub fn forget(&mut self, locale: &str) -> Option<String> {
        self.0.remove(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_json(&self) -> DomainResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> DomainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Translations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Value assigned to a translatable field
///
/// `Single` targets one locale and leaves the others alone; `Map`
/// replaces the field wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatableValue {
    Single(String),
    Map(Translations),
}

impl From<&str> for TranslatableValue {
    fn from(value: &str) -> Self {
        TranslatableValue::Single(value.to_string())
    }
}

impl From<String> for TranslatableValue {
    fn from(value: String) -> Self {
        TranslatableValue::Single(value)
    }
}

impl From<Translations> for TranslatableValue {
    fn from(value: Translations) -> Self {
        TranslatableValue::Map(value)
    }
}
