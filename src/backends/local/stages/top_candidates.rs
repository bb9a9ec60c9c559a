// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::read_candidates;
use crate::candidates::select_diverse;
use crate::config::stage_map::StageNumber;
use crate::engine::StageContext;
use crate::observability::messages::stage::{DiversityApplied, UpstreamInputMissing};
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageOutput, StageTimer, UpstreamOutput};

const NUMBER: StageNumber = StageNumber::TOP_CANDIDATES;
const STAGE: &str = "08_top_candidates";

/// Stage 8: diversity-capped re-ranking and top-N truncation.
///
/// Upstream order is not trusted; candidates are stable-sorted by descending
/// score first so equal scores keep their upstream order.
pub struct TopCandidatesStage;

impl TopCandidatesStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TopCandidatesStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for TopCandidatesStage {
    fn number(&self) -> StageNumber {
        NUMBER
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        let timer = StageTimer::start();

        let mut candidates = match upstream {
            Some(u) => read_candidates(STAGE, &u.data)?,
            None => {
                UpstreamInputMissing { stage_id: STAGE }.log();
                Vec::new()
            }
        };
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let result = select_diverse(&candidates, &ctx.config.diversity);

        DiversityApplied {
            stage_id: STAGE,
            input_count: result.stats.input_count,
            output_count: result.stats.output_count,
            deferred_count: result.stats.deferred_count,
        }
        .log();

        let data: Value = serde_json::to_value(&result)?;
        Ok(StageOutput::new(NUMBER, ctx, upstream, data, timer))
    }
}
