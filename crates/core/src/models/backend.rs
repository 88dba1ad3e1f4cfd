//! # Assistant Backend
//!
//! The remote service as the session sees it: a stateless completion
//! endpoint (used for file summaries) and a stateful assistant / thread / run
//! API shared by the architect and developer roles.

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a remote assistant (one per role)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssistantId(pub String);

/// Handle of a remote, append-only conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two pipeline roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Architect,
    Developer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Architect => f.write_str("architect"),
            Role::Developer => f.write_str("developer"),
        }
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the service for a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// One execution of a role against a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// JSON schema the assistant's replies must conform to
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

/// Everything needed to create a role on the remote service
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantDefinition {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub response_schema: Option<ResponseSchema>,
}

/// Remote text-generation service
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Single-shot completion with a system and a user message
    async fn complete(&self, model: &str, system: &str, user: &str)
        -> Result<String, BackendError>;

    async fn create_assistant(
        &self,
        definition: &AssistantDefinition,
    ) -> Result<AssistantId, BackendError>;

    async fn create_thread(&self) -> Result<ThreadId, BackendError>;

    /// Append a user message to the thread
    async fn post_message(&self, thread: &ThreadId, content: &str) -> Result<(), BackendError>;

    /// Start a run of `assistant` on `thread`
    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<Run, BackendError>;

    /// Current state of a run
    async fn poll_run(&self, thread: &ThreadId, run_id: &str) -> Result<Run, BackendError>;

    /// Text of the messages produced by `run`, newest first
    async fn run_messages(&self, thread: &ThreadId, run: &Run)
        -> Result<Vec<String>, BackendError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory backend for pipeline tests.

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Script {
        assistants: Vec<AssistantDefinition>,
        threads: usize,
        summary_requests: Vec<String>,
        posted: Vec<(ThreadId, String)>,
        scripted_runs: VecDeque<(RunStatus, Vec<String>)>,
        run_assistants: Vec<String>,
        run_outputs: HashMap<String, Vec<String>>,
        run_statuses: HashMap<String, RunStatus>,
        throttled_polls: u32,
    }

    /// Clones share the same script, so tests keep a handle for inspection.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedBackend {
        inner: Arc<Mutex<Script>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queue the outcome of the next run
        pub(crate) fn push_run(&self, status: RunStatus, messages: &[&str]) {
            self.inner.lock().unwrap().scripted_runs.push_back((
                status,
                messages.iter().map(|m| m.to_string()).collect(),
            ));
        }

        /// Answer the next `count` status checks with a rate limit
        pub(crate) fn throttle_polls(&self, count: u32) {
            self.inner.lock().unwrap().throttled_polls = count;
        }

        pub(crate) fn posted(&self) -> Vec<String> {
            let script = self.inner.lock().unwrap();
            script.posted.iter().map(|(_, m)| m.clone()).collect()
        }

        /// Role names of the assistants each run was started with, one
        /// entry per run created
        pub(crate) fn run_roles(&self) -> Vec<String> {
            self.inner.lock().unwrap().run_assistants.clone()
        }

        pub(crate) fn summary_requests(&self) -> Vec<String> {
            self.inner.lock().unwrap().summary_requests.clone()
        }

        pub(crate) fn assistants(&self) -> Vec<AssistantDefinition> {
            self.inner.lock().unwrap().assistants.clone()
        }
    }

    #[async_trait]
    impl AssistantBackend for ScriptedBackend {
        async fn complete(
            &self,
            _model: &str,
            _system: &str,
            user: &str,
        ) -> Result<String, BackendError> {
            let mut script = self.inner.lock().unwrap();
            script.summary_requests.push(user.to_string());
            // Second line of the request is "<name>:"
            let name = user.lines().nth(1).unwrap_or_default().trim_end_matches(':');
            Ok(format!("{name} summary #{}", script.summary_requests.len()))
        }

        async fn create_assistant(
            &self,
            definition: &AssistantDefinition,
        ) -> Result<AssistantId, BackendError> {
            let mut script = self.inner.lock().unwrap();
            script.assistants.push(definition.clone());
            Ok(AssistantId(format!("asst_{}", script.assistants.len())))
        }

        async fn create_thread(&self) -> Result<ThreadId, BackendError> {
            let mut script = self.inner.lock().unwrap();
            script.threads += 1;
            Ok(ThreadId(format!("thread_{}", script.threads)))
        }

        async fn post_message(
            &self,
            thread: &ThreadId,
            content: &str,
        ) -> Result<(), BackendError> {
            let mut script = self.inner.lock().unwrap();
            script.posted.push((thread.clone(), content.to_string()));
            Ok(())
        }

        async fn create_run(
            &self,
            _thread: &ThreadId,
            assistant: &AssistantId,
        ) -> Result<Run, BackendError> {
            let mut script = self.inner.lock().unwrap();
            let (status, messages) = script
                .scripted_runs
                .pop_front()
                .ok_or_else(|| BackendError::Decode("no scripted run left".to_string()))?;
            let index: usize = assistant.0.trim_start_matches("asst_").parse().unwrap();
            let role_name = script.assistants[index - 1].name.clone();
            script.run_assistants.push(role_name);
            let id = format!("run_{}", script.run_assistants.len());
            script.run_outputs.insert(id.clone(), messages);
            script.run_statuses.insert(id.clone(), status);
            Ok(Run {
                id,
                status: RunStatus::Queued,
                last_error: None,
            })
        }

        async fn poll_run(&self, _thread: &ThreadId, run_id: &str) -> Result<Run, BackendError> {
            let mut script = self.inner.lock().unwrap();
            if script.throttled_polls > 0 {
                script.throttled_polls -= 1;
                return Err(BackendError::RateLimited {
                    message: "Rate limit reached. Please try again in 0.001s.".to_string(),
                    retry_after: None,
                });
            }
            let status = script
                .run_statuses
                .get(run_id)
                .copied()
                .ok_or_else(|| BackendError::Decode(format!("unknown run {run_id}")))?;
            Ok(Run {
                id: run_id.to_string(),
                status,
                last_error: None,
            })
        }

        async fn run_messages(
            &self,
            _thread: &ThreadId,
            run: &Run,
        ) -> Result<Vec<String>, BackendError> {
            let script = self.inner.lock().unwrap();
            Ok(script.run_outputs.get(&run.id).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
    }

    #[test]
    fn test_run_decodes_unknown_status() {
        let run: Run = serde_json::from_str(r#"{"id":"run_1","status":"paused"}"#).unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(run.last_error.is_none());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Architect.to_string(), "architect");
        assert_eq!(Role::Developer.to_string(), "developer");
    }
}
