// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::cost::CostSnapshot;

/// Lifecycle of one run: `Idle -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Final status of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Degraded,
    Skipped,
}

/// A stage failure as reported in the run result.
///
/// `error` is the stage's own message, verbatim. `continued` tells whether
/// the run went on past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageErrorRecord {
    pub stage_id: String,
    pub error: String,
    pub continued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTiming {
    pub duration_ms: u64,
    /// Wall-clock milliseconds per attempted stage, keyed by stage id.
    pub per_stage: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub session_id: String,
    pub run_id: String,
    pub state: RunState,
    pub success: bool,
    pub stages_executed: Vec<String>,
    pub stages_skipped: Vec<String>,
    pub final_stage: Option<String>,
    pub errors: Vec<StageErrorRecord>,
    pub degraded_stages: Vec<String>,
    pub timing: RunTiming,
    pub stage_status: BTreeMap<String, StageStatus>,
    pub costs: CostSnapshot,
    /// Data of the last successful stage; not part of the serialized report.
    #[serde(skip)]
    pub output: Option<Value>,
}
