// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The JSON annotation record: filename → tags

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::RecordFormat;
use crate::persist::write_atomic;
use crate::Result;

/// One image's entry in the nested record format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Either on-disk entry shape; both are accepted when loading
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Flat(Vec<String>),
    Nested(Annotation),
}

impl StoredEntry {
    fn into_tags(self) -> Vec<String> {
        match self {
            StoredEntry::Flat(tags) => tags,
            StoredEntry::Nested(annotation) => annotation.tags,
        }
    }
}

/// In-memory copy of the record file.
///
/// Loaded whole, rewritten whole. Keys are kept sorted so that an unchanged
/// set of images always serializes to the same keys in the same order.
#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    format: RecordFormat,
    entries: BTreeMap<String, Vec<String>>,
}

impl AnnotationStore {
    /// Start an empty store that will be written to `path`
    pub fn new(path: PathBuf, format: RecordFormat) -> Self {
        Self {
            path,
            format,
            entries: BTreeMap::new(),
        }
    }

    /// Load the record at `path`; an absent or blank file yields an empty store
    pub fn load(path: &Path, format: RecordFormat) -> Result<Self> {
        let mut store = Self::new(path.to_path_buf(), format);

        if !path.exists() {
            debug!("No record at {:?}, starting empty", path);
            return Ok(store);
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(store);
        }

        let stored: BTreeMap<String, StoredEntry> = serde_json::from_str(&content)?;
        store.entries = stored
            .into_iter()
            .map(|(name, entry)| (name, entry.into_tags()))
            .collect();

        info!("Loaded {} existing record(s) from {:?}", store.entries.len(), path);
        Ok(store)
    }

    /// Set the tags for a file, replacing any previous entry wholesale
    pub fn insert(&mut self, filename: String, tags: Vec<String>) -> Option<Vec<String>> {
        self.entries.insert(filename, tags)
    }

    pub fn get(&self, filename: &str) -> Option<&[String]> {
        self.entries.get(filename).map(Vec::as_slice)
    }

    /// Drop every entry whose filename fails `keep`; returns how many were removed
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|name, _| keep(name));
        before - self.entries.len()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the record in the configured format, indented
    pub fn to_json(&self) -> Result<String> {
        let json = match self.format {
            RecordFormat::Flat => serde_json::to_string_pretty(&self.entries)?,
            RecordFormat::Nested => {
                let nested: BTreeMap<&str, Annotation> = self
                    .entries
                    .iter()
                    .map(|(name, tags)| {
                        (
                            name.as_str(),
                            Annotation {
                                filename: name.clone(),
                                tags: tags.clone(),
                            },
                        )
                    })
                    .collect();
                serde_json::to_string_pretty(&nested)?
            }
        };
        Ok(json)
    }

    /// Overwrite the record file with the full in-memory contents
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut json = self.to_json()?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes())?;
        debug!("Wrote {} record(s) to {:?}", self.entries.len(), self.path);
        Ok(())
    }
}
