// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced by the pipeline executor and the failure strategy that
//! decides what happens when a stage's own logic fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CheckpointError, StageError};

/// Fatal executor errors.
///
/// Stage-execution failures are *not* represented here: they are caught by the
/// executor and reported in the run result (halted or degraded). Only problems
/// that make the run itself impossible end up as an `ExecutionError`.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Pipeline configuration error: {0}")]
    Configuration(#[from] StageError),

    #[error("Checkpoint storage error: {0}")]
    Storage(#[from] CheckpointError),

    /// The checkpoint a resume starts from is missing or unreadable.
    #[error("Cannot resume: checkpoint for stage '{stage_id}' in source run '{source_run_id}' is unavailable: {reason}")]
    ResumeCheckpointMissing {
        stage_id: String,
        source_run_id: String,
        reason: String,
    },
}

/// How the executor reacts when a stage returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Stop the run at the first failing stage and mark it failed.
    #[default]
    FailFast,
    /// Record the failure, mark the stage degraded and keep going with the
    /// last successful stage's output.
    ContinueOnError,
}

impl FailureStrategy {
    pub fn continues_on_error(self) -> bool {
        matches!(self, FailureStrategy::ContinueOnError)
    }
}
