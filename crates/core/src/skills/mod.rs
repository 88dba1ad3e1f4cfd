//! # SwiftSmith Skills
//!
//! The three model-backed roles of a session.
//!
//! - `ArchitectSkill` - Plans which files change, replies with a `ChangePlan`
//! - `DeveloperSkill` - Writes the code for an accepted plan
//! - `Summarizer` - Keeps one short summary per workspace file
//!
//! Shared pieces: `prompts` (role instructions) and `llm_helpers`
//! (rate-limit retry).

pub mod architect_skill;
pub mod developer_skill;
pub mod llm_helpers;
pub mod prompts;
pub mod summarizer_skill;

pub use architect_skill::{ArchitectSkill, ChangePlan};
pub use developer_skill::DeveloperSkill;
pub use llm_helpers::RetryPolicy;
pub use summarizer_skill::{SummaryRefresh, Summarizer};
