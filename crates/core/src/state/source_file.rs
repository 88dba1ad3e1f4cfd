//! # Source Files
//!
//! The in-memory view of the scanned workspace, keyed by file name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A scanned source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    /// File name, unique across roots
    pub name: String,
    /// Content prefixed with `"{name}:\n"`
    pub code: String,
    /// Owning module
    pub target: String,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    /// The model holds this exact content in its thread
    #[serde(default)]
    pub disclosed: bool,
    /// Seen by the most recent scan
    #[serde(default = "default_on_disk")]
    pub on_disk: bool,
}

fn default_on_disk() -> bool {
    true
}

impl SourceFile {
    /// Fresh, undisclosed entry for content just read from disk
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        path: impl Into<PathBuf>,
        body: &str,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            code: format!("{name}:\n{body}"),
            name,
            target: target.into(),
            path: path.into(),
            modified_at,
            disclosed: false,
            on_disk: true,
        }
    }

    /// Full body as it is attached to a message
    pub fn attachment(&self) -> String {
        format!("\nFrom {} target:\n{}", self.target, self.code)
    }
}

/// All files the session knows about
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FileCatalog {
    files: BTreeMap<String, SourceFile>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name
    pub fn upsert(&mut self, file: SourceFile) {
        self.files.insert(file.name.clone(), file);
    }

    pub fn get(&self, name: &str) -> Option<&SourceFile> {
        self.files.get(name)
    }

    /// Present in the catalog and on disk at the last scan
    pub fn is_known(&self, name: &str) -> bool {
        self.files.get(name).is_some_and(|f| f.on_disk)
    }

    pub fn known_names(&self) -> BTreeSet<String> {
        self.files
            .values()
            .filter(|f| f.on_disk)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn disclosed_names(&self) -> BTreeSet<String> {
        self.files
            .values()
            .filter(|f| f.disclosed)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn mark_disclosed<'a>(&mut self, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            if let Some(file) = self.files.get_mut(name) {
                file.disclosed = true;
            }
        }
    }

    /// Flag every file not in `seen` as gone from disk; content is kept.
    /// Returns the names that just went missing.
    pub fn mark_missing(&mut self, seen: &BTreeSet<String>) -> Vec<String> {
        let mut missing = Vec::new();
        for file in self.files.values_mut() {
            let present = seen.contains(&file.name);
            if file.on_disk && !present {
                missing.push(file.name.clone());
            }
            file.on_disk = present;
        }
        missing
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
