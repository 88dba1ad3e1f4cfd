//! # Assistant Configuration
//!
//! Persisted as `config.json` in the runtime directory. Every field has a
//! default, so a partial file (or none at all) is valid; command-line flags
//! are applied on top by the binary.

use crate::models::ModelConfig;
use crate::skills::llm_helpers::RetryPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source extension scanned by default
pub const DEFAULT_EXTENSION: &str = "swift";

/// Theme used when the configured one is unknown
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// One project root to scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRoot {
    pub path: PathBuf,
    /// Target name override; defaults to the root's directory name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ScanRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Owning module for every file found under this root
    pub fn target_name(&self) -> String {
        if let Some(target) = &self.target {
            return target.clone();
        }
        let resolved = self
            .path
            .canonicalize()
            .unwrap_or_else(|_| self.path.clone());
        resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Full configuration of an assistant session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    #[serde(default)]
    pub roots: Vec<ScanRoot>,
    /// Scanned extension, with or without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Delay between run status checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// syntect theme for rendered code
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extension: default_extension(),
            models: ModelConfig::default(),
            retry: RetryPolicy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            theme: default_theme(),
        }
    }
}

impl AssistantConfig {
    /// Config scanning the given roots with defaults everywhere else
    pub fn for_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(ScanRoot::new).collect(),
            ..Self::default()
        }
    }

    /// Load from disk; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Replace the configured roots (command-line override)
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        if !roots.is_empty() {
            self.roots = roots.into_iter().map(ScanRoot::new).collect();
        }
        self
    }

    /// Replace the scanned extension when one is given
    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        if let Some(extension) = extension {
            self.extension = extension;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// A session needs at least one root and a non-empty extension
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            bail!("No project roots configured; pass --root or add \"roots\" to config.json");
        }
        if self.extension.trim_start_matches('.').is_empty() {
            bail!("The scanned extension must not be empty");
        }
        Ok(())
    }
}
