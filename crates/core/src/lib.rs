//! # SwiftSmith Core
//!
//! Everything behind the `swiftsmith` binary: workspace scanning, file
//! summaries, the architect → developer conversation and reply rendering.
//!
//! ## Architecture
//!
//! - `tools/` - Workspace scanner
//! - `skills/` - Role definitions, prompts, summarizer, rate-limit retry
//! - `models/` - Model selection and the remote service backend
//! - `state/` - File catalog, summaries, session snapshots
//! - `session/` - `CodingAssistant` and the per-round pipeline
//! - `render` - Fenced-code splitting and terminal highlighting
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swiftsmith_core::config::AssistantConfig;
//! use swiftsmith_core::session::CodingAssistant;
//!
//! let config = AssistantConfig::for_roots(["./MyApp"]);
//! let backend = config.models.create_backend()?;
//! let mut assistant = CodingAssistant::open(&config, backend).await?;
//! let answer = assistant.ask("Add a settings screen", false).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod session;
pub mod skills;
pub mod state;
pub mod tools;

pub use config::{AssistantConfig, ScanRoot};
pub use error::{AskError, BackendError, SessionError};
pub use session::{Answer, CodingAssistant};
