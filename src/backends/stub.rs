// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for executor and registry tests.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::stage_map::StageNumber;
use crate::engine::cost::CostUsage;
use crate::engine::StageContext;
use crate::traits::{ExecutionObserver, Stage, StageOutput, StageTimer, UpstreamOutput};

/// A stage that succeeds and reports which upstream output it saw.
///
/// Output data: `{ "stage": <id>, "input": <upstream id or null> }`.
pub struct StubStage {
    pub number: StageNumber,
    pub id_override: Option<String>,
    pub usage: Option<CostUsage>,
}

impl StubStage {
    pub fn new(number: StageNumber) -> Self {
        Self {
            number,
            id_override: None,
            usage: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id_override = Some(id.to_string());
        self
    }

    /// Record this usage against the stage's cost slot on every execution.
    pub fn with_usage(mut self, usage: CostUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[async_trait]
impl Stage for StubStage {
    fn number(&self) -> StageNumber {
        self.number
    }

    fn id(&self) -> String {
        self.id_override.clone().unwrap_or_else(|| self.number.id())
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        let timer = StageTimer::start();
        if let Some(usage) = self.usage {
            ctx.record_cost(usage);
        }
        let data = json!({
            "stage": self.id(),
            "input": upstream.map(|u| u.stage_id.clone()),
        });
        Ok(StageOutput::new(self.number, ctx, upstream, data, timer))
    }
}

/// A stage whose execution always fails with a fixed message.
pub struct FailingStage {
    pub number: StageNumber,
    pub message: String,
}

impl FailingStage {
    pub fn new(number: StageNumber, message: &str) -> Self {
        Self {
            number,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn number(&self) -> StageNumber {
        self.number
    }

    async fn execute(
        &self,
        _ctx: &StageContext,
        _upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        anyhow::bail!("{}", self.message)
    }
}

/// Observer that records every callback as `"<event>:<stage_id>"`.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_stage_start(&self, stage_id: &str) {
        self.push(format!("start:{}", stage_id));
    }

    fn on_stage_complete(&self, stage_id: &str, _duration: Duration) {
        self.push(format!("complete:{}", stage_id));
    }

    fn on_stage_error(&self, stage_id: &str, error: &str) {
        self.push(format!("error:{}:{}", stage_id, error));
    }

    fn on_stage_skip(&self, stage_id: &str) {
        self.push(format!("skip:{}", stage_id));
    }
}
