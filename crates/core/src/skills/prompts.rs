//! Default role instructions bundled at compile time.

/// Architect - picks files to change and drafts a plan
pub const ARCHITECT: &str = include_str!("defaults/architect.md");

/// Developer - writes the SwiftUI changes
pub const DEVELOPER: &str = include_str!("defaults/developer.md");

/// Summarizer - three-sentence description of one file
pub const SUMMARIZER: &str = include_str!("defaults/summarizer.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("architect", ARCHITECT),
        ("developer", DEVELOPER),
        ("summarizer", SUMMARIZER),
    ]
}
