use std::sync::Arc;

use super::stages::*;
use crate::config::stage_map::StageNumber;
use crate::observability::messages::stage::PassthroughStageInstalled;
use crate::observability::messages::StructuredLog;
use crate::traits::Stage;

/// Factory for the built-in (in-process) stage implementations
pub struct LocalStageFactory;

impl LocalStageFactory {
    /// Create the built-in implementation for a stage number
    ///
    /// - 4 -> NormalizeStage
    /// - 5 -> DedupeStage
    /// - 8 -> TopCandidatesStage
    /// - anything else -> PassthroughStage (logged as a fallback)
    pub fn create(number: StageNumber) -> Arc<dyn Stage> {
        match number {
            StageNumber::NORMALIZE => Arc::new(NormalizeStage::new()),
            StageNumber::DEDUPE => Arc::new(DedupeStage::new()),
            StageNumber::TOP_CANDIDATES => Arc::new(TopCandidatesStage::new()),
            other => {
                PassthroughStageInstalled {
                    stage_id: &other.id(),
                }
                .log();
                Arc::new(PassthroughStage::new(other))
            }
        }
    }

    /// One stage per stage number, in ascending order
    pub fn create_all() -> Vec<Arc<dyn Stage>> {
        StageNumber::all().map(Self::create).collect()
    }

    /// Stage numbers that have a real built-in implementation
    pub fn built_in_stages() -> Vec<StageNumber> {
        vec![
            StageNumber::NORMALIZE,
            StageNumber::DEDUPE,
            StageNumber::TOP_CANDIDATES,
        ]
    }

    pub fn has_built_in(number: StageNumber) -> bool {
        Self::built_in_stages().contains(&number)
    }
}
