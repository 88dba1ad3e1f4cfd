//! # Coding Assistant
//!
//! One conversation with the two-role pipeline. Each `ask` round refreshes
//! the workspace, lets the architect plan against file summaries, then lets
//! the developer write code against the full bodies of the planned files.
//! Both roles share one thread, so anything disclosed once stays in context.

use super::disclosure::DisclosureTracker;
use super::pipeline::{Pipeline, PipelineStage};
use crate::config::AssistantConfig;
use crate::error::{AskError, SessionError};
use crate::models::backend::{AssistantBackend, AssistantId, Role, Run, RunStatus, ThreadId};
use crate::skills::architect_skill::{ArchitectSkill, ChangePlan};
use crate::skills::developer_skill::DeveloperSkill;
use crate::skills::llm_helpers::{with_rate_limit_retry, RetryPolicy};
use crate::skills::summarizer_skill::{SummaryRefresh, Summarizer};
use crate::state::{FileCatalog, SessionSnapshot, SummaryBook, SNAPSHOT_VERSION};
use crate::tools::scanner::{ScanReport, WorkspaceScanner};
use chrono::Utc;
use std::collections::BTreeSet;
use std::time::Duration;

/// Result of a successful round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The developer's reply
    pub text: String,
    pub plan: ChangePlan,
    /// Files sent in full during this round
    pub disclosed: Vec<String>,
}

/// What a workspace refresh changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub scan: ScanReport,
    pub summaries: SummaryRefresh,
}

pub struct CodingAssistant<B: AssistantBackend> {
    backend: B,
    scanner: WorkspaceScanner,
    summarizer: Summarizer,
    retry: RetryPolicy,
    poll_interval: Duration,
    architect: AssistantId,
    developer: AssistantId,
    thread: ThreadId,
    first_round: bool,
    files: FileCatalog,
    summaries: SummaryBook,
    selected: BTreeSet<String>,
    last_plan: Option<ChangePlan>,
    pipeline: Pipeline,
    /// Every summary was generated since the last round
    summaries_fresh: bool,
}

impl<B: AssistantBackend> CodingAssistant<B> {
    /// Create both roles, index the workspace and start a fresh thread
    pub async fn open(config: &AssistantConfig, backend: B) -> Result<Self, AskError> {
        config.validate().map_err(AskError::Config)?;
        let retry = config.retry.clone();

        let developer_def = DeveloperSkill::new(&config.models).definition();
        let developer = with_rate_limit_retry(&retry, "create developer", || {
            backend.create_assistant(&developer_def)
        })
        .await?;

        let architect_def = ArchitectSkill::new(&config.models).definition();
        let architect = with_rate_limit_retry(&retry, "create architect", || {
            backend.create_assistant(&architect_def)
        })
        .await?;

        let thread = with_rate_limit_retry(&retry, "create thread", || backend.create_thread())
            .await?;
        tracing::info!(%thread, "Started conversation");

        let mut assistant = Self {
            backend,
            scanner: WorkspaceScanner::from_config(config),
            summarizer: Summarizer::new(&config.models, retry.clone()),
            retry,
            poll_interval: config.poll_interval(),
            architect,
            developer,
            thread,
            first_round: true,
            files: FileCatalog::new(),
            summaries: SummaryBook::new(),
            selected: BTreeSet::new(),
            last_plan: None,
            pipeline: Pipeline::new(),
            summaries_fresh: false,
        };
        assistant.refresh(false).await?;
        assistant.summaries_fresh = true;
        Ok(assistant)
    }

    /// Continue a saved session; no remote objects are created
    pub fn resume(config: &AssistantConfig, backend: B, snapshot: SessionSnapshot) -> Self {
        let mut scanner = WorkspaceScanner::from_config(config);
        scanner.set_watermark(snapshot.watermark);
        tracing::debug!(thread = %snapshot.thread, files = snapshot.files.len(), "Resumed session");

        Self {
            backend,
            scanner,
            summarizer: Summarizer::new(&config.models, config.retry.clone()),
            retry: config.retry.clone(),
            poll_interval: config.poll_interval(),
            architect: snapshot.architect,
            developer: snapshot.developer,
            thread: snapshot.thread,
            first_round: snapshot.first_round,
            files: snapshot.files,
            summaries: snapshot.summaries,
            selected: snapshot.selected,
            last_plan: snapshot.last_plan,
            pipeline: Pipeline::new(),
            summaries_fresh: false,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            architect: self.architect.clone(),
            developer: self.developer.clone(),
            thread: self.thread.clone(),
            first_round: self.first_round,
            watermark: self.scanner.watermark(),
            files: self.files.clone(),
            summaries: self.summaries.clone(),
            selected: self.selected.clone(),
            last_plan: self.last_plan.clone(),
        }
    }

    /// Rescan the roots, then summarize what is new.
    ///
    /// `force_summaries` regenerates every summary, unless all of them were
    /// produced since the last round; then only files changed on disk since
    /// are redone.
    pub async fn refresh(&mut self, force_summaries: bool) -> Result<RefreshReport, AskError> {
        let scan = self.scanner.scan(&mut self.files)?;

        let force_all = force_summaries && !self.summaries_fresh;
        if force_summaries && !force_all {
            tracing::debug!(changed = scan.updated.len(), "Summaries are fresh, redoing changed files only");
            for name in &scan.updated {
                self.summaries.remove(name);
            }
        }
        let summaries = self
            .summarizer
            .refresh(&self.backend, &self.files, &mut self.summaries, force_all)
            .await?;
        if force_all {
            self.summaries_fresh = true;
        }
        Ok(RefreshReport { scan, summaries })
    }

    /// Share these files in full with the architect on the next round
    pub fn select_files<I, S>(&mut self, names: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let unknown: Vec<String> = names
            .iter()
            .filter(|name| !self.files.is_known(name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SessionError::UnknownFiles(unknown));
        }
        self.selected = names;
        Ok(())
    }

    /// Unblock a session whose previous round was interrupted mid-flight.
    /// Messages already posted stay on the thread.
    pub fn abandon_round(&mut self) -> Option<PipelineStage> {
        let stage = self.pipeline.abandon();
        if let Some(stage) = stage {
            tracing::warn!(?stage, "Abandoned interrupted round");
        }
        stage
    }

    /// Run one architect → developer round
    #[tracing::instrument(skip(self, question), fields(thread = %self.thread))]
    pub async fn ask(&mut self, question: &str, force_summaries: bool) -> Result<Answer, AskError> {
        if self.pipeline.is_pending() {
            tracing::warn!(stage = ?self.pipeline.stage, "Previous round never settled");
            return Err(AskError::Busy(self.pipeline.stage));
        }
        if let Err(err) = self.refresh(force_summaries).await {
            tracing::error!(error = %err, "Workspace refresh failed");
            return Err(err);
        }
        self.summaries_fresh = false;
        self.pipeline.start_round().map_err(AskError::Busy)?;

        let outcome = self.run_round(question).await;
        if let Err(err) = &outcome {
            tracing::error!(error = %err, stage = ?self.pipeline.stage, "Round failed");
            self.pipeline.fail();
        }
        let stage = self.pipeline.settle();
        tracing::debug!(?stage, "Round settled");
        outcome
    }

    async fn run_round(&mut self, question: &str) -> Result<Answer, AskError> {
        let brief = DisclosureTracker::new(&self.files, &self.summaries).architect_brief(
            self.first_round,
            &self.selected,
            question,
        );
        tracing::info!(
            summaries = brief.summarized.len(),
            attached = brief.attached.len(),
            "Asking architect"
        );
        let (architect_run, raw) = self.run_stage(Role::Architect, &brief.text, &[]).await?;

        let plan = ChangePlan::parse(&raw)?;
        plan.validate(|name| self.files.is_known(name))?;
        tracing::info!(files = ?plan.files_to_modify, "Architect planned changes");
        self.pipeline.advance();

        let developer_brief = DisclosureTracker::new(&self.files, &self.summaries)
            .developer_brief(&plan, &brief.attached);
        self.pipeline.advance();
        tracing::info!(attached = developer_brief.attached.len(), "Asking developer");
        let (_, text) = self
            .run_stage(Role::Developer, &developer_brief.text, &[architect_run])
            .await?;
        self.pipeline.advance();

        let disclosed: Vec<String> = brief
            .attached
            .into_iter()
            .chain(developer_brief.attached)
            .collect();
        self.files.mark_disclosed(&disclosed);
        self.first_round = false;
        self.selected.clear();
        self.last_plan = Some(plan.clone());

        Ok(Answer {
            text,
            plan,
            disclosed,
        })
    }

    /// Post `message`, run `role` on the thread and return its newest reply
    async fn run_stage(
        &self,
        role: Role,
        message: &str,
        earlier: &[Run],
    ) -> Result<(Run, String), AskError> {
        let assistant = match role {
            Role::Architect => &self.architect,
            Role::Developer => &self.developer,
        };

        with_rate_limit_retry(&self.retry, "post message", || {
            self.backend.post_message(&self.thread, message)
        })
        .await?;
        // Retry per request; a run is created at most once
        let mut run = with_rate_limit_retry(&self.retry, "start run", || {
            self.backend.create_run(&self.thread, assistant)
        })
        .await?;
        while !run.status.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            let run_id = run.id.clone();
            run = with_rate_limit_retry(&self.retry, "poll run", || {
                self.backend.poll_run(&self.thread, &run_id)
            })
            .await?;
        }

        if run.status != RunStatus::Completed {
            match &run.last_error {
                Some(error) => tracing::error!(
                    %role,
                    run = %run.id,
                    status = %run.status,
                    code = %error.code,
                    "{}",
                    error.message
                ),
                None => tracing::error!(%role, run = %run.id, status = %run.status, "Run did not complete"),
            }
            return Err(AskError::RunFailed { role, run });
        }

        let messages = with_rate_limit_retry(&self.retry, "read messages", || {
            self.backend.run_messages(&self.thread, &run)
        })
        .await?;
        match messages.into_iter().next() {
            Some(text) => Ok((run, text)),
            None => {
                let mut runs = earlier.to_vec();
                runs.push(run);
                Err(AskError::EmptyResult { role, runs })
            }
        }
    }

    pub fn files(&self) -> &FileCatalog {
        &self.files
    }

    pub fn summaries(&self) -> &SummaryBook {
        &self.summaries
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn last_plan(&self) -> Option<&ChangePlan> {
        self.last_plan.as_ref()
    }

    pub fn thread(&self) -> &ThreadId {
        &self.thread
    }

    pub fn is_first_round(&self) -> bool {
        self.first_round
    }

    pub fn stage(&self) -> PipelineStage {
        self.pipeline.stage
    }
}
