// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::observability::messages::executor::{StageCompleted, StageFailed, StageSkipped, StageStarted};
use crate::observability::messages::StructuredLog;

/// Hooks the executor calls as stages move through their lifecycle.
///
/// Every method has a no-op default so observers only implement what they need.
pub trait ExecutionObserver: Send + Sync {
    fn on_stage_start(&self, _stage_id: &str) {}

    fn on_stage_complete(&self, _stage_id: &str, _duration: Duration) {}

    fn on_stage_error(&self, _stage_id: &str, _error: &str) {}

    fn on_stage_skip(&self, _stage_id: &str) {}
}

/// Default observer: emits the executor log messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_stage_start(&self, stage_id: &str) {
        StageStarted { stage_id }.log();
    }

    fn on_stage_complete(&self, stage_id: &str, duration: Duration) {
        StageCompleted { stage_id, duration }.log();
    }

    fn on_stage_error(&self, stage_id: &str, error: &str) {
        StageFailed { stage_id, error }.log();
    }

    fn on_stage_skip(&self, stage_id: &str) {
        StageSkipped { stage_id }.log();
    }
}
