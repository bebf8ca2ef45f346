//! Configuration
//!
//! Where the tag database lives and which locale is current.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{DomainResult, Locale};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// SQLite file, or `:memory:`
    pub database_path: PathBuf,
    /// Locale used when a call does not name one
    pub locale: Locale,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("tags.db"),
            locale: Locale::default(),
        }
    }
}

impl TagConfig {
    pub fn in_memory() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
