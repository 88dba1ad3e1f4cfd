//! # SwiftSmith Models
//!
//! Model selection for the three kinds of remote calls (summaries,
//! architect runs, developer runs) and the backend that serves them.
//!
//! ## Example
//! ```rust,ignore
//! use swiftsmith_core::models::ModelConfig;
//!
//! let config = ModelConfig::default().with_base_url("http://localhost:8080/v1");
//! let backend = config.create_backend()?;
//! ```

pub mod backend;
pub mod openai;

use crate::error::BackendError;
use backend::Role;
use openai::OpenAiBackend;
use serde::{Deserialize, Serialize};

/// Configuration for LLM model selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Model used for per-file summaries
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    /// Model bound to the architect role
    #[serde(default = "default_role_model")]
    pub architect_model: String,
    /// Model bound to the developer role
    #[serde(default = "default_role_model")]
    pub developer_model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_summary_model() -> String {
    "gpt-4o".to_string()
}

fn default_role_model() -> String {
    "gpt-4o-2024-08-06".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            summary_model: default_summary_model(),
            architect_model: default_role_model(),
            developer_model: default_role_model(),
            base_url: None,
        }
    }
}

impl ModelConfig {
    /// Use the same model everywhere
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            summary_model: model.clone(),
            architect_model: model.clone(),
            developer_model: model,
            base_url: None,
        }
    }

    /// Set base URL (for OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Model bound to a pipeline role
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Architect => &self.architect_model,
            Role::Developer => &self.developer_model,
        }
    }

    /// Create the REST backend, reading the API key from the environment
    pub fn create_backend(&self) -> Result<OpenAiBackend, BackendError> {
        OpenAiBackend::from_env(self.base_url.as_deref())
    }
}
