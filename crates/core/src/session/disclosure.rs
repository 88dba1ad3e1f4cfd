//! # Disclosure Tracking
//!
//! Composes the two user messages of a round so that the thread only ever
//! receives what the model does not already hold: summaries of undisclosed
//! files for the architect, and full bodies of undisclosed plan files for
//! the developer.

use crate::skills::architect_skill::ChangePlan;
use crate::state::{FileCatalog, SummaryBook};
use std::collections::BTreeSet;

pub const FIRST_SUMMARIES_HEADER: &str =
    "These are the file summaries for each file in the codebase you will be assisting with:";
pub const UPDATED_SUMMARIES_HEADER: &str =
    "I have updated the codebase. Here are the new file summaries:";
pub const SELECTED_FILES_HEADER: &str = "These are the full files the user selected:";
pub const PLAN_FILES_HEADER: &str = "These are the full files you'll be modifying:";
pub const DEVELOPER_CLOSING: &str =
    "Please use this code and the code plan to attend to the user's question";

/// Architect message and what it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectBrief {
    pub text: String,
    /// Files represented by a summary
    pub summarized: Vec<String>,
    /// Files attached in full
    pub attached: Vec<String>,
}

/// Developer message and what it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperBrief {
    pub text: String,
    /// Plan files attached in full, in plan order
    pub attached: Vec<String>,
}

/// Read-only view over the session state used to build messages
pub struct DisclosureTracker<'a> {
    catalog: &'a FileCatalog,
    summaries: &'a SummaryBook,
}

impl<'a> DisclosureTracker<'a> {
    pub fn new(catalog: &'a FileCatalog, summaries: &'a SummaryBook) -> Self {
        Self { catalog, summaries }
    }

    /// Files the thread already holds verbatim
    pub fn already_disclosed(&self) -> BTreeSet<String> {
        self.catalog.disclosed_names()
    }

    pub fn architect_brief(
        &self,
        first_round: bool,
        selected: &BTreeSet<String>,
        question: &str,
    ) -> ArchitectBrief {
        let disclosed = self.already_disclosed();
        let attached: Vec<String> = selected
            .iter()
            .filter(|name| self.catalog.is_known(name) && !disclosed.contains(*name))
            .cloned()
            .collect();

        let summarized: Vec<String> = self
            .summaries
            .iter()
            .map(|(name, _)| name.to_string())
            .filter(|name| !disclosed.contains(name) && !attached.contains(name))
            .collect();

        let mut blocks = Vec::new();
        if first_round || !summarized.is_empty() {
            let header = if first_round {
                FIRST_SUMMARIES_HEADER
            } else {
                UPDATED_SUMMARIES_HEADER
            };
            let mut block = header.to_string();
            for name in &summarized {
                let summary = self.summaries.get(name).unwrap_or_default();
                block.push_str(&format!("\n{name}: {summary}"));
            }
            blocks.push(block);
        }

        if !attached.is_empty() {
            blocks.push(self.attachments(SELECTED_FILES_HEADER, &attached));
        }
        blocks.push(question.to_string());

        ArchitectBrief {
            text: blocks.join("\n"),
            summarized,
            attached,
        }
    }

    /// `attached_up_front` lists files already sent in full this round
    pub fn developer_brief(&self, plan: &ChangePlan, attached_up_front: &[String]) -> DeveloperBrief {
        let disclosed = self.already_disclosed();
        let attached: Vec<String> = plan
            .files_to_modify
            .iter()
            .filter(|name| !disclosed.contains(*name) && !attached_up_front.contains(*name))
            .filter(|name| self.catalog.get(name).is_some())
            .cloned()
            .collect();

        let mut blocks = Vec::new();
        if !attached.is_empty() {
            blocks.push(self.attachments(PLAN_FILES_HEADER, &attached));
        }
        blocks.push(DEVELOPER_CLOSING.to_string());

        DeveloperBrief {
            text: blocks.join("\n"),
            attached,
        }
    }

    fn attachments(&self, header: &str, names: &[String]) -> String {
        let mut block = header.to_string();
        for file in names.iter().filter_map(|name| self.catalog.get(name)) {
            block.push_str(&file.attachment());
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SourceFile;
    use chrono::Utc;

    fn state(names: &[&str]) -> (FileCatalog, SummaryBook) {
        let mut catalog = FileCatalog::new();
        let mut summaries = SummaryBook::new();
        for name in names {
            catalog.upsert(SourceFile::new(
                *name,
                "MyApp",
                format!("/p/MyApp/{name}"),
                &format!("// {name} body"),
                Utc::now(),
            ));
            summaries.insert(*name, format!("About {name}."));
        }
        (catalog, summaries)
    }

    #[test]
    fn test_first_round_sends_every_summary() {
        let (catalog, summaries) = state(&["A.swift", "B.swift"]);
        let brief = DisclosureTracker::new(&catalog, &summaries).architect_brief(
            true,
            &BTreeSet::new(),
            "Add a button",
        );
        assert_eq!(
            brief.text,
            format!(
                "{FIRST_SUMMARIES_HEADER}\nA.swift: About A.swift.\nB.swift: About B.swift.\nAdd a button"
            )
        );
        assert_eq!(brief.summarized, vec!["A.swift", "B.swift"]);
        assert!(brief.attached.is_empty());
    }

    #[test]
    fn test_disclosed_files_are_not_summarized_again() {
        let (mut catalog, summaries) = state(&["A.swift", "B.swift"]);
        catalog.mark_disclosed(&["A.swift".to_string()]);

        let brief = DisclosureTracker::new(&catalog, &summaries).architect_brief(
            false,
            &BTreeSet::new(),
            "Rename it",
        );
        assert!(brief.text.starts_with(UPDATED_SUMMARIES_HEADER));
        assert!(!brief.text.contains("About A.swift."));
        assert_eq!(brief.summarized, vec!["B.swift"]);
    }

    #[test]
    fn test_later_round_without_news_is_just_the_question() {
        let (mut catalog, summaries) = state(&["A.swift"]);
        catalog.mark_disclosed(&["A.swift".to_string()]);
        let brief = DisclosureTracker::new(&catalog, &summaries).architect_brief(
            false,
            &BTreeSet::new(),
            "Why?",
        );
        assert_eq!(brief.text, "Why?");
    }

    #[test]
    fn test_selected_files_are_attached_instead_of_summarized() {
        let (catalog, summaries) = state(&["A.swift", "B.swift"]);
        let selected: BTreeSet<String> = ["B.swift".to_string()].into();
        let brief =
            DisclosureTracker::new(&catalog, &summaries).architect_brief(true, &selected, "Q");

        assert_eq!(brief.summarized, vec!["A.swift"]);
        assert_eq!(brief.attached, vec!["B.swift"]);
        assert!(brief.text.contains(&format!(
            "{SELECTED_FILES_HEADER}\nFrom MyApp target:\nB.swift:\n// B.swift body"
        )));
        assert!(!brief.text.contains("About B.swift."));
        assert!(brief.text.ends_with("\nQ"));
    }

    #[test]
    fn test_developer_gets_only_undisclosed_plan_files() {
        let (mut catalog, summaries) = state(&["x.swift", "y.swift"]);
        catalog.mark_disclosed(&["x.swift".to_string()]);
        let plan = ChangePlan {
            files_to_modify: vec!["x.swift".into(), "y.swift".into()],
            plan: "Change both".into(),
        };

        let brief = DisclosureTracker::new(&catalog, &summaries).developer_brief(&plan, &[]);
        assert_eq!(brief.attached, vec!["y.swift"]);
        assert_eq!(
            brief.text,
            format!(
                "{PLAN_FILES_HEADER}\nFrom MyApp target:\ny.swift:\n// y.swift body\n{DEVELOPER_CLOSING}"
            )
        );
        assert!(!brief.text.contains("x.swift body"));
    }

    #[test]
    fn test_developer_skips_files_attached_up_front() {
        let (catalog, summaries) = state(&["x.swift"]);
        let plan = ChangePlan {
            files_to_modify: vec!["x.swift".into()],
            plan: "Change x".into(),
        };
        let brief = DisclosureTracker::new(&catalog, &summaries)
            .developer_brief(&plan, &["x.swift".to_string()]);
        assert!(brief.attached.is_empty());
        assert_eq!(brief.text, DEVELOPER_CLOSING);
    }
}
