//! # Pipeline Stages
//!
//! Tracks where an `ask` round is in the architect → developer hand-off.

use serde::{Deserialize, Serialize};

/// Stage of the current (or last) round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// No round has started
    #[default]
    Idle,
    /// Architect message posted, run in flight
    ArchitectPending,
    /// Architect produced a valid plan
    ArchitectDone,
    /// Architect run failed or its plan was rejected
    ArchitectFailed,
    /// Developer message posted, run in flight
    DeveloperPending,
    /// Developer answered
    DeveloperDone,
    /// Developer run failed
    DeveloperFailed,
}

/// The round state machine
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub stage: PipelineStage,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a round; refused while another is still pending
    pub fn start_round(&mut self) -> Result<(), PipelineStage> {
        if self.is_pending() {
            return Err(self.stage);
        }
        self.stage = PipelineStage::ArchitectPending;
        Ok(())
    }

    /// Advance to the next stage on success
    pub fn advance(&mut self) {
        self.stage = match self.stage {
            PipelineStage::ArchitectPending => PipelineStage::ArchitectDone,
            PipelineStage::ArchitectDone => PipelineStage::DeveloperPending,
            PipelineStage::DeveloperPending => PipelineStage::DeveloperDone,
            other => other,
        };
    }

    /// Fail the stage in flight
    pub fn fail(&mut self) {
        self.stage = match self.stage {
            PipelineStage::ArchitectPending | PipelineStage::ArchitectDone => {
                PipelineStage::ArchitectFailed
            }
            PipelineStage::DeveloperPending => PipelineStage::DeveloperFailed,
            other => other,
        };
    }

    /// A run is in flight (or was interrupted while in flight)
    pub fn is_pending(&self) -> bool {
        matches!(
            self.stage,
            PipelineStage::ArchitectPending | PipelineStage::DeveloperPending
        )
    }

    /// Forget an interrupted round
    pub fn abandon(&mut self) -> Option<PipelineStage> {
        if !self.is_pending() {
            return None;
        }
        let stage = self.stage;
        self.stage = PipelineStage::Idle;
        Some(stage)
    }

    /// Close a finished round, returning the stage it ended in.
    /// A pending round is left as is.
    pub fn settle(&mut self) -> PipelineStage {
        let stage = self.stage;
        if !self.is_pending() {
            self.stage = PipelineStage::Idle;
        }
        stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_advance() {
        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.stage, PipelineStage::Idle);

        pipeline.start_round().unwrap();
        assert_eq!(pipeline.stage, PipelineStage::ArchitectPending);

        pipeline.advance();
        assert_eq!(pipeline.stage, PipelineStage::ArchitectDone);

        pipeline.advance();
        assert_eq!(pipeline.stage, PipelineStage::DeveloperPending);

        pipeline.advance();
        assert_eq!(pipeline.stage, PipelineStage::DeveloperDone);

        assert_eq!(pipeline.settle(), PipelineStage::DeveloperDone);
        assert_eq!(pipeline.stage, PipelineStage::Idle);
        pipeline.start_round().unwrap();
    }

    #[test]
    fn test_failure_is_attributed_to_the_stage() {
        let mut pipeline = Pipeline::new();
        pipeline.start_round().unwrap();
        pipeline.fail();
        assert_eq!(pipeline.stage, PipelineStage::ArchitectFailed);

        pipeline.start_round().unwrap();
        pipeline.advance();
        pipeline.advance();
        pipeline.fail();
        assert_eq!(pipeline.settle(), PipelineStage::DeveloperFailed);
        assert_eq!(pipeline.stage, PipelineStage::Idle);
    }

    #[test]
    fn test_interrupted_round_blocks_until_abandoned() {
        let mut pipeline = Pipeline::new();
        pipeline.start_round().unwrap();
        assert_eq!(pipeline.start_round(), Err(PipelineStage::ArchitectPending));
        // Settling does not clear an interrupted round
        assert_eq!(pipeline.settle(), PipelineStage::ArchitectPending);
        assert!(pipeline.is_pending());

        assert_eq!(pipeline.abandon(), Some(PipelineStage::ArchitectPending));
        assert_eq!(pipeline.abandon(), None);
        pipeline.start_round().unwrap();
    }
}
