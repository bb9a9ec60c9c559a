// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::candidates::{normalize_worker_results, parse_worker_outputs};
use crate::checkpoint::store::now_iso8601;
use crate::config::stage_map::StageNumber;
use crate::engine::StageContext;
use crate::observability::messages::stage::{CandidatesProcessed, IdCollisionsResolved, UpstreamInputMissing};
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageOutput, StageTimer, UpstreamOutput};

const NUMBER: StageNumber = StageNumber::NORMALIZE;

/// Stage 4: raw worker results in, identified candidates out.
pub struct NormalizeStage;

impl NormalizeStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NormalizeStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for NormalizeStage {
    fn number(&self) -> StageNumber {
        NUMBER
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        let timer = StageTimer::start();
        let stage_id = self.id();

        let payload = match upstream {
            Some(u) if u.data.get("results").is_some() => u.data.clone(),
            _ => {
                UpstreamInputMissing { stage_id: &stage_id }.log();
                json!({ "results": [] })
            }
        };

        let outputs = parse_worker_outputs(&payload)?;
        let result = normalize_worker_results(
            &outputs,
            ctx.config.limits.max_candidates_per_worker,
            &now_iso8601(),
        );

        if result.stats.collisions_resolved > 0 {
            IdCollisionsResolved {
                stage_id: &stage_id,
                collisions: result.stats.collisions_resolved,
            }
            .log();
        }
        CandidatesProcessed {
            stage_id: &stage_id,
            input_count: result.stats.input_count,
            output_count: result.stats.output_count,
        }
        .log();

        let data: Value = serde_json::to_value(&result)?;
        Ok(StageOutput::new(NUMBER, ctx, upstream, data, timer))
    }
}
