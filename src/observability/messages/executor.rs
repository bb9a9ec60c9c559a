// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline run and stage lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Run start, completion and failure
//! * Resume from a prior run's checkpoint
//! * Per-stage start, completion, failure and skip

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A pipeline run is starting.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_waypoint::observability::messages::executor::RunStarted;
///
/// let msg = RunStarted {
///     session_id: "20250101-tokyo",
///     run_id: "run-42",
///     first_stage: 0,
///     last_stage: 10,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub session_id: &'a str,
    pub run_id: &'a str,
    pub first_stage: u8,
    pub last_stage: u8,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline run {} for session {}: stages {}..={}",
            self.run_id, self.session_id, self.first_stage, self.last_stage
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            session_id = self.session_id,
            run_id = self.run_id,
            first_stage = self.first_stage,
            last_stage = self.last_stage,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_run",
            span_name = name,
            session_id = self.session_id,
            run_id = self.run_id,
            first_stage = self.first_stage,
            last_stage = self.last_stage,
        )
    }
}

/// Resume is seeding the run from another run's checkpoint.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ResumeStarted<'a> {
    pub run_id: &'a str,
    pub source_run_id: &'a str,
    pub from_stage: u8,
    pub skipped: usize,
}

impl Display for ResumeStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resuming run {} from stage {} using run {} ({} stages skipped)",
            self.run_id, self.from_stage, self.source_run_id, self.skipped
        )
    }
}

impl StructuredLog for ResumeStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            source_run_id = self.source_run_id,
            from_stage = self.from_stage,
            skipped = self.skipped,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "resume",
            span_name = name,
            run_id = self.run_id,
            source_run_id = self.source_run_id,
            from_stage = self.from_stage,
        )
    }
}

/// A run finished (possibly degraded).
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_waypoint::observability::messages::executor::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     run_id: "run-42",
///     stages_executed: 11,
///     degraded_stages: 1,
///     duration: Duration::from_millis(1250),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunCompleted<'a> {
    pub run_id: &'a str,
    pub stages_executed: usize,
    pub degraded_stages: usize,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run {} completed: {} stages executed ({} degraded) in {:?}",
            self.run_id, self.stages_executed, self.degraded_stages, self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            stages_executed = self.stages_executed,
            degraded_stages = self.degraded_stages,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            run_id = self.run_id,
            stages_executed = self.stages_executed,
            duration = ?self.duration,
        )
    }
}

/// A run stopped on a failing stage.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunFailed<'a> {
    pub run_id: &'a str,
    pub stage_id: &'a str,
    pub error: &'a str,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run {} halted at stage {}: {}",
            self.run_id, self.stage_id, self.error
        )
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = self.run_id,
            stage_id = self.stage_id,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            run_id = self.run_id,
            stage_id = self.stage_id,
            error = self.error,
        )
    }
}

/// A stage is about to execute.
///
/// # Log Level
/// `debug!` - Detailed lifecycle event
pub struct StageStarted<'a> {
    pub stage_id: &'a str,
}

impl Display for StageStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} starting", self.stage_id)
    }
}

impl StructuredLog for StageStarted<'_> {
    fn log(&self) {
        tracing::debug!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("stage", span_name = name, stage_id = self.stage_id)
    }
}

/// A stage returned successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageCompleted<'a> {
    pub stage_id: &'a str,
    pub duration: Duration,
}

impl Display for StageCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} completed in {:?}", self.stage_id, self.duration)
    }
}

impl StructuredLog for StageCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_completed",
            span_name = name,
            stage_id = self.stage_id,
            duration = ?self.duration,
        )
    }
}

/// A stage returned an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_waypoint::observability::messages::executor::StageFailed;
///
/// let msg = StageFailed {
///     stage_id: "03_workers",
///     error: "places API quota exceeded",
/// };
///
/// assert_eq!(msg.to_string(), "Stage 03_workers failed: places API quota exceeded");
/// ```
pub struct StageFailed<'a> {
    pub stage_id: &'a str,
    pub error: &'a str,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} failed: {}", self.stage_id, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::error!(stage_id = self.stage_id, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stage_failed",
            span_name = name,
            stage_id = self.stage_id,
            error = self.error,
        )
    }
}

/// A failed stage was absorbed and the run carries on degraded.
///
/// # Log Level
/// `warn!` - Degraded but continuing
pub struct StageDegraded<'a> {
    pub stage_id: &'a str,
    pub input_from: Option<&'a str>,
}

impl Display for StageDegraded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.input_from {
            Some(upstream) => write!(
                f,
                "Continuing past degraded stage {} with output of {}",
                self.stage_id, upstream
            ),
            None => write!(
                f,
                "Continuing past degraded stage {} with no upstream output",
                self.stage_id
            ),
        }
    }
}

impl StructuredLog for StageDegraded<'_> {
    fn log(&self) {
        tracing::warn!(
            stage_id = self.stage_id,
            input_from = self.input_from.unwrap_or("none"),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("stage_degraded", span_name = name, stage_id = self.stage_id)
    }
}

/// A stage is skipped because a resume starts after it.
///
/// # Log Level
/// `debug!` - Detailed lifecycle event
pub struct StageSkipped<'a> {
    pub stage_id: &'a str,
}

impl Display for StageSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} skipped", self.stage_id)
    }
}

impl StructuredLog for StageSkipped<'_> {
    fn log(&self) {
        tracing::debug!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stage_skipped", span_name = name, stage_id = self.stage_id)
    }
}
