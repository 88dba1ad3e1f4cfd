//! # Workspace Scanner
//!
//! Walks the configured project roots and loads every source file that
//! changed since the previous scan into the `FileCatalog`.
//!
//! Change detection is timestamp based: a file is (re)loaded when its
//! modification time is strictly after the watermark, or unconditionally on
//! the first scan. Every scan walks the full tree so files that vanished from
//! disk can be flagged.

use crate::config::{AssistantConfig, ScanRoot};
use crate::state::{FileCatalog, SourceFile};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A root resolved to its target name
#[derive(Debug, Clone)]
struct ResolvedRoot {
    path: PathBuf,
    target: String,
}

/// What a scan changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files loaded (new or modified) by this scan
    pub updated: Vec<String>,
    /// Files that disappeared from disk since the previous scan
    pub missing: Vec<String>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.missing.is_empty()
    }
}

pub struct WorkspaceScanner {
    roots: Vec<ResolvedRoot>,
    /// Name suffix, including the dot
    suffix: String,
    watermark: Option<DateTime<Utc>>,
}

impl WorkspaceScanner {
    pub fn new(roots: &[ScanRoot], extension: &str) -> Self {
        let roots = roots
            .iter()
            .map(|root| ResolvedRoot {
                path: root.path.clone(),
                target: root.target_name(),
            })
            .collect();
        Self {
            roots,
            suffix: format!(".{}", extension.trim_start_matches('.')),
            watermark: None,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(&config.roots, &config.extension)
    }

    /// Time of the last completed scan
    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    /// Restore a watermark saved with a session
    pub fn set_watermark(&mut self, watermark: Option<DateTime<Utc>>) {
        self.watermark = watermark;
    }

    /// Scan every root into `catalog`. The catalog is left untouched when
    /// any root fails.
    pub fn scan(&mut self, catalog: &mut FileCatalog) -> Result<ScanReport> {
        // Taken before walking so edits made during the walk are seen next time
        let started = Utc::now();
        let mut seen = BTreeSet::new();
        let mut loaded = Vec::new();

        for root in &self.roots {
            for path in self.source_files(&root.path)? {
                let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
                else {
                    continue;
                };
                seen.insert(name.clone());

                let modified_at = modified_time(&path)?;
                let changed = self.watermark.map_or(true, |mark| modified_at > mark);
                let reappeared = catalog.get(&name).is_some_and(|f| !f.on_disk);
                if !changed && !reappeared {
                    continue;
                }

                let body = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                tracing::debug!(file = %name, target = %root.target, "Loaded source file");
                loaded.push(SourceFile::new(
                    name,
                    root.target.clone(),
                    path,
                    &body,
                    modified_at,
                ));
            }
        }

        let mut report = ScanReport::default();
        for file in loaded {
            report.updated.push(file.name.clone());
            catalog.upsert(file);
        }
        report.missing = catalog.mark_missing(&seen);
        self.watermark = Some(started);

        if !report.is_empty() {
            tracing::info!(
                updated = report.updated.len(),
                missing = report.missing.len(),
                "Workspace scanned"
            );
        }
        Ok(report)
    }

    /// Matching files under `root`, in a stable order
    fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().ends_with(&self.suffix) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

fn modified_time(path: &Path) -> Result<DateTime<Utc>> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(modified.into())
}
