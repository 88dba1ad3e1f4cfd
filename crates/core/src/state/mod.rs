//! # State
//!
//! What a session knows about the workspace and how it is persisted.

pub mod io;
pub mod session_state;
pub mod source_file;
pub mod summaries;

pub use session_state::{load_snapshot, save_snapshot, SessionSnapshot, SNAPSHOT_VERSION};
pub use source_file::{FileCatalog, SourceFile};
pub use summaries::SummaryBook;
