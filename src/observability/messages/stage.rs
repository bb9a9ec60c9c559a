// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the stage factory and events raised inside stages.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The factory has no implementation for a stage and installs a passthrough.
///
/// # Log Level
/// `warn!` - Degraded behavior
///
/// # Example
/// ```
/// use the_waypoint::observability::messages::stage::PassthroughStageInstalled;
///
/// let msg = PassthroughStageInstalled { stage_id: "06_rank" };
/// tracing::warn!("{}", msg);
/// ```
pub struct PassthroughStageInstalled<'a> {
    pub stage_id: &'a str,
}

impl Display for PassthroughStageInstalled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No built-in implementation for stage {}, forwarding upstream output unchanged",
            self.stage_id
        )
    }
}

impl StructuredLog for PassthroughStageInstalled<'_> {
    fn log(&self) {
        tracing::warn!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("passthrough_stage", span_name = name, stage_id = self.stage_id)
    }
}

/// A stage that expects upstream data ran without any.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct UpstreamInputMissing<'a> {
    pub stage_id: &'a str,
}

impl Display for UpstreamInputMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} received no upstream output, treating input as empty",
            self.stage_id
        )
    }
}

impl StructuredLog for UpstreamInputMissing<'_> {
    fn log(&self) {
        tracing::warn!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("upstream_missing", span_name = name, stage_id = self.stage_id)
    }
}

/// Summary of a candidate-processing stage.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CandidatesProcessed<'a> {
    pub stage_id: &'a str,
    pub input_count: usize,
    pub output_count: usize,
}

impl Display for CandidatesProcessed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} turned {} candidates into {}",
            self.stage_id, self.input_count, self.output_count
        )
    }
}

impl StructuredLog for CandidatesProcessed<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            input_count = self.input_count,
            output_count = self.output_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "candidates_processed",
            span_name = name,
            stage_id = self.stage_id,
            input_count = self.input_count,
            output_count = self.output_count,
        )
    }
}

/// Near-duplicate clustering finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DedupCompleted<'a> {
    pub stage_id: &'a str,
    pub original_count: usize,
    pub deduped_count: usize,
    pub cluster_count: usize,
}

impl Display for DedupCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} merged {} candidates into {} ({} clusters, {} duplicates removed)",
            self.stage_id,
            self.original_count,
            self.deduped_count,
            self.cluster_count,
            self.original_count - self.deduped_count
        )
    }
}

impl StructuredLog for DedupCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            original_count = self.original_count,
            deduped_count = self.deduped_count,
            cluster_count = self.cluster_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dedup_completed",
            span_name = name,
            stage_id = self.stage_id,
            cluster_count = self.cluster_count,
        )
    }
}

/// Diversity re-ranking and truncation finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DiversityApplied<'a> {
    pub stage_id: &'a str,
    pub input_count: usize,
    pub output_count: usize,
    pub deferred_count: usize,
}

impl Display for DiversityApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} selected {} of {} candidates ({} moved by diversity caps)",
            self.stage_id, self.output_count, self.input_count, self.deferred_count
        )
    }
}

impl StructuredLog for DiversityApplied<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            input_count = self.input_count,
            output_count = self.output_count,
            deferred_count = self.deferred_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "diversity_applied",
            span_name = name,
            stage_id = self.stage_id,
            output_count = self.output_count,
        )
    }
}

/// Candidate id collisions were resolved with numeric suffixes.
///
/// # Log Level
/// `debug!` - Expected, but worth seeing when tracing identity issues
pub struct IdCollisionsResolved<'a> {
    pub stage_id: &'a str,
    pub collisions: usize,
}

impl Display for IdCollisionsResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} resolved {} candidate id collisions",
            self.stage_id, self.collisions
        )
    }
}

impl StructuredLog for IdCollisionsResolved<'_> {
    fn log(&self) {
        tracing::debug!(stage_id = self.stage_id, collisions = self.collisions, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "id_collisions_resolved",
            span_name = name,
            stage_id = self.stage_id,
            collisions = self.collisions,
        )
    }
}

/// A worker item could not be read into its worker's shape and was dropped.
///
/// # Log Level
/// `warn!` - Degraded behavior
pub struct WorkerItemRejected<'a> {
    pub stage_id: &'a str,
    pub worker: &'a str,
    pub reason: &'a str,
}

impl Display for WorkerItemRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} dropped a {} item: {}",
            self.stage_id, self.worker, self.reason
        )
    }
}

impl StructuredLog for WorkerItemRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            stage_id = self.stage_id,
            worker = self.worker,
            reason = self.reason,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "worker_item_rejected",
            span_name = name,
            stage_id = self.stage_id,
            worker = self.worker,
        )
    }
}
