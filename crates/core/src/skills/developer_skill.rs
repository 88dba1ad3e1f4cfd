//! # Developer Skill
//!
//! The coding role. It runs on the same thread as the architect, so the plan
//! and every file already disclosed are part of its context.

use crate::models::backend::{AssistantDefinition, Role};
use crate::models::ModelConfig;
use crate::skills::prompts;

/// Developer role definition
pub struct DeveloperSkill {
    model: String,
}

impl DeveloperSkill {
    pub const NAME: &'static str = "SwiftUI Developer";

    pub fn new(config: &ModelConfig) -> Self {
        Self {
            model: config.for_role(Role::Developer).to_string(),
        }
    }

    /// Free-text replies, no tools
    pub fn definition(&self) -> AssistantDefinition {
        AssistantDefinition {
            name: Self::NAME.to_string(),
            model: self.model.clone(),
            instructions: prompts::DEVELOPER.to_string(),
            response_schema: None,
        }
    }
}
