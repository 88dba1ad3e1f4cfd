//! # Summarizer Skill
//!
//! Keeps one short description per known file. Summaries are produced
//! lazily, one independent completion per file, and pruned when their file
//! disappears from the workspace.

use crate::error::BackendError;
use crate::models::backend::AssistantBackend;
use crate::models::ModelConfig;
use crate::skills::llm_helpers::{with_rate_limit_retry, RetryPolicy};
use crate::skills::prompts;
use crate::state::{FileCatalog, SourceFile, SummaryBook};

/// What a refresh changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRefresh {
    pub generated: Vec<String>,
    pub pruned: Vec<String>,
}

/// Generates and prunes file summaries
pub struct Summarizer {
    model: String,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(config: &ModelConfig, retry: RetryPolicy) -> Self {
        Self {
            model: config.summary_model.clone(),
            retry,
        }
    }

    /// Summarize every known file lacking a summary (or all of them when
    /// `force_all`), then drop summaries of files no longer known.
    pub async fn refresh<B: AssistantBackend + ?Sized>(
        &self,
        backend: &B,
        catalog: &FileCatalog,
        book: &mut SummaryBook,
        force_all: bool,
    ) -> Result<SummaryRefresh, BackendError> {
        let known = catalog.known_names();
        let pending: Vec<&SourceFile> = catalog
            .iter()
            .filter(|f| known.contains(&f.name))
            .filter(|f| force_all || !book.contains(&f.name))
            .collect();

        let mut report = SummaryRefresh::default();
        if !pending.is_empty() {
            tracing::info!(files = pending.len(), force_all, "Generating file summaries");
        }
        for (idx, file) in pending.into_iter().enumerate() {
            tracing::debug!(file = %file.name, progress = idx + 1, "Summarizing");
            let summary = self.summarize(backend, file).await?;
            book.insert(file.name.clone(), summary);
            report.generated.push(file.name.clone());
        }

        report.pruned = book.retain_known(&known);
        if !report.pruned.is_empty() {
            tracing::info!(pruned = ?report.pruned, "Dropped summaries of removed files");
        }
        Ok(report)
    }

    /// One completion for one file
    pub async fn summarize<B: AssistantBackend + ?Sized>(
        &self,
        backend: &B,
        file: &SourceFile,
    ) -> Result<String, BackendError> {
        let request = summary_request(file);
        let summary = with_rate_limit_retry(&self.retry, "summarize", || {
            backend.complete(&self.model, prompts::SUMMARIZER, &request)
        })
        .await?;
        Ok(summary.trim().to_string())
    }
}

/// User message sent for one file
pub fn summary_request(file: &SourceFile) -> String {
    format!(
        "Please summarize this file from the {} target:\n{}",
        file.target, file.code
    )
}
