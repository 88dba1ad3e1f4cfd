//! # Session
//!
//! The conversation with the architect and developer roles.
//!
//! ## Modules
//!
//! - `assistant` - `CodingAssistant`, one thread and its bookkeeping
//! - `disclosure` - composes the per-round messages
//! - `pipeline` - round state machine

pub mod assistant;
pub mod disclosure;
pub mod pipeline;

pub use assistant::{Answer, CodingAssistant, RefreshReport};
pub use disclosure::{ArchitectBrief, DeveloperBrief, DisclosureTracker};
pub use pipeline::{Pipeline, PipelineStage};
