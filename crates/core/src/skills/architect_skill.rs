//! # Architect Skill
//!
//! The planning role. It reads file summaries and the user's request, then
//! answers with a `ChangePlan`: which files to modify and how, without code.
//! Replies are constrained to the plan's JSON schema on the service side and
//! decoded strictly on ours.

use crate::error::AskError;
use crate::models::backend::{AssistantDefinition, ResponseSchema, Role};
use crate::models::ModelConfig;
use crate::skills::prompts;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Output from the architect role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePlan {
    /// File names, with extension, that must change to satisfy the request
    pub files_to_modify: Vec<String>,
    /// How to implement the request
    pub plan: String,
}

impl ChangePlan {
    /// Decode an architect reply. Missing, extra or mistyped fields fail;
    /// repeated file names collapse onto their first occurrence.
    pub fn parse(raw: &str) -> Result<Self, AskError> {
        let mut plan: ChangePlan =
            serde_json::from_str(raw.trim()).map_err(|e| AskError::MalformedPlan {
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
        let mut seen = HashSet::new();
        plan.files_to_modify.retain(|name| seen.insert(name.clone()));
        Ok(plan)
    }

    /// Every named file must satisfy `is_known`
    pub fn validate(&self, is_known: impl Fn(&str) -> bool) -> Result<(), AskError> {
        let unknown: Vec<String> = self
            .files_to_modify
            .iter()
            .filter(|name| !is_known(name))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AskError::InvalidPlan { unknown })
        }
    }
}

/// Structured-output schema handed to the service
pub fn change_plan_schema() -> ResponseSchema {
    ResponseSchema {
        name: "ChangePlan".to_string(),
        schema: schemars::schema_for!(ChangePlan).to_value(),
    }
}

/// Architect role definition
pub struct ArchitectSkill {
    model: String,
}

impl ArchitectSkill {
    pub const NAME: &'static str = "SwiftUI Architect";

    pub fn new(config: &ModelConfig) -> Self {
        Self {
            model: config.for_role(Role::Architect).to_string(),
        }
    }

    pub fn definition(&self) -> AssistantDefinition {
        AssistantDefinition {
            name: Self::NAME.to_string(),
            model: self.model.clone(),
            instructions: prompts::ARCHITECT.to_string(),
            response_schema: Some(change_plan_schema()),
        }
    }
}
