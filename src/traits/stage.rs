// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stage contract consumed by the pipeline executor.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::config::stage_map::StageNumber;
use crate::engine::StageContext;

/// Output of the stage a stage consumes: the upstream id and its data.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamOutput {
    pub stage_id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetadata {
    pub stage_number: u8,
    pub stage_name: String,
    pub session_id: String,
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_stage: Option<String>,
    /// Snapshot of the run configuration the stage ran with.
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub started_at: String,
    pub completed_at: String,
    pub duration_ms: u64,
}

/// What a stage hands back to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub data: Value,
    pub metadata: StageMetadata,
    pub timing: StageTiming,
}

/// Wall-clock and monotonic start of a stage body.
#[derive(Debug, Clone)]
pub struct StageTimer {
    started_at: String,
    start: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> StageTiming {
        StageTiming {
            started_at: self.started_at,
            completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: self.start.elapsed().as_millis() as u64,
        }
    }
}

impl StageOutput {
    /// Assemble an output for `stage`, filling metadata from the context.
    pub fn new(
        stage: StageNumber,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
        data: Value,
        timer: StageTimer,
    ) -> Self {
        Self {
            data,
            metadata: StageMetadata {
                stage_number: stage.get(),
                stage_name: stage.name().to_string(),
                session_id: ctx.session_id.clone(),
                run_id: ctx.run_id.clone(),
                upstream_stage: upstream.map(|u| u.stage_id.clone()),
                config: serde_json::to_value(ctx.config.as_ref()).unwrap_or(Value::Null),
            },
            timing: timer.finish(),
        }
    }
}

/// A numbered unit of pipeline work.
///
/// `id` and `name` default to the catalogue entry for `number`; the registry
/// rejects implementations whose id prefix disagrees with their number.
#[async_trait]
pub trait Stage: Send + Sync {
    fn number(&self) -> StageNumber;

    fn name(&self) -> &'static str {
        self.number().name()
    }

    fn id(&self) -> String {
        self.number().id()
    }

    /// Run the stage against the upstream output (`None` for stage 0 or when
    /// nothing upstream succeeded).
    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput>;
}
