//! # Tools
//!
//! Deterministic helpers that feed the model with workspace facts.
//!
//! - `scanner` - Walks the project roots into the file catalog

pub mod scanner;

pub use scanner::{ScanReport, WorkspaceScanner};
