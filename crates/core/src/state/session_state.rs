//! # Session State
//!
//! Serialisable snapshot of a `CodingAssistant`, saved as `session.json`
//! so the next CLI invocation continues the same remote thread with the
//! same disclosure bookkeeping.

use super::{FileCatalog, SummaryBook};
use crate::models::backend::{AssistantId, ThreadId};
use crate::skills::architect_skill::ChangePlan;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Bumped whenever the snapshot layout changes incompatibly
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything a session needs to resume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub architect: AssistantId,
    pub developer: AssistantId,
    pub thread: ThreadId,
    pub first_round: bool,
    /// Scanner watermark
    #[serde(default)]
    pub watermark: Option<DateTime<Utc>>,
    pub files: FileCatalog,
    pub summaries: SummaryBook,
    #[serde(default)]
    pub selected: BTreeSet<String>,
    #[serde(default)]
    pub last_plan: Option<ChangePlan>,
}

/// Load a snapshot; `None` when no session was saved yet
pub fn load_snapshot(path: &Path) -> Result<Option<SessionSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;

    let snapshot: SessionSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if snapshot.version != SNAPSHOT_VERSION {
        bail!(
            "Session file {} has version {}, expected {}; run `swiftsmith reset`",
            path.display(),
            snapshot.version,
            SNAPSHOT_VERSION
        );
    }

    Ok(Some(snapshot))
}

/// Save a snapshot, stamping `saved_at`
pub fn save_snapshot(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    let mut snapshot = snapshot.clone();
    snapshot.saved_at = Utc::now();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content =
        serde_json::to_string_pretty(&snapshot).with_context(|| "Failed to serialize session")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write session file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SourceFile;

    fn snapshot() -> SessionSnapshot {
        let mut files = FileCatalog::new();
        let mut file = SourceFile::new("A.swift", "App", "/p/App/A.swift", "let a = 1", Utc::now());
        file.disclosed = true;
        files.upsert(file);
        let mut summaries = SummaryBook::new();
        summaries.insert("A.swift", "Declares a constant.");

        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            architect: AssistantId("asst_a".into()),
            developer: AssistantId("asst_d".into()),
            thread: ThreadId("thread_1".into()),
            first_round: false,
            watermark: Some(Utc::now()),
            files,
            summaries,
            selected: BTreeSet::new(),
            last_plan: None,
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("session.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_save_then_load_keeps_disclosure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        save_snapshot(&path, &snapshot()).unwrap();

        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded.thread, ThreadId("thread_1".into()));
        assert!(loaded.files.disclosed_names().contains("A.swift"));
        assert_eq!(loaded.summaries.get("A.swift"), Some("Declares a constant."));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut old = snapshot();
        old.version = SNAPSHOT_VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&old).unwrap()).unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("swiftsmith reset"));
    }
}
