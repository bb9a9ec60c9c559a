// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for checkpoint persistence and manifest integrity events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A stage checkpoint was written to disk.
///
/// # Log Level
/// `debug!` - Detailed persistence event
pub struct CheckpointWritten<'a> {
    pub stage_id: &'a str,
    pub path: &'a Path,
    pub size_bytes: u64,
}

impl Display for CheckpointWritten<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wrote checkpoint for {} ({} bytes) to {}",
            self.stage_id,
            self.size_bytes,
            self.path.display()
        )
    }
}

impl StructuredLog for CheckpointWritten<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            path = %self.path.display(),
            size_bytes = self.size_bytes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "checkpoint_written",
            span_name = name,
            stage_id = self.stage_id,
            path = %self.path.display(),
        )
    }
}

/// A checkpoint from an earlier run was loaded as resume input.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CheckpointLoaded<'a> {
    pub stage_id: &'a str,
    pub path: &'a Path,
}

impl Display for CheckpointLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded checkpoint for {} from {}",
            self.stage_id,
            self.path.display()
        )
    }
}

impl StructuredLog for CheckpointLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            path = %self.path.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "checkpoint_loaded",
            span_name = name,
            stage_id = self.stage_id,
            path = %self.path.display(),
        )
    }
}

/// The run manifest was saved.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_waypoint::observability::messages::checkpoint::ManifestSaved;
/// use std::path::Path;
///
/// let msg = ManifestSaved {
///     run_id: "run-42",
///     path: Path::new("data/session/runs/run-42/manifest.json"),
///     entries: 11,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ManifestSaved<'a> {
    pub run_id: &'a str,
    pub path: &'a Path,
    pub entries: usize,
}

impl Display for ManifestSaved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Saved manifest for run {} with {} entries to {}",
            self.run_id,
            self.entries,
            self.path.display()
        )
    }
}

impl StructuredLog for ManifestSaved<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            entries = self.entries,
            path = %self.path.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "manifest_saved",
            span_name = name,
            run_id = self.run_id,
            entries = self.entries,
        )
    }
}

/// Manifest verification finished.
///
/// # Log Level
/// `info!` when valid, `warn!` when any entry mismatched
pub struct ManifestVerified<'a> {
    pub run_id: &'a str,
    pub valid: bool,
    pub checked: usize,
    pub mismatched: usize,
}

impl Display for ManifestVerified<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.valid {
            write!(
                f,
                "Manifest for run {} verified: {} checkpoints intact",
                self.run_id, self.checked
            )
        } else {
            write!(
                f,
                "Manifest for run {} failed verification: {} of {} checkpoints differ",
                self.run_id, self.mismatched, self.checked
            )
        }
    }
}

impl StructuredLog for ManifestVerified<'_> {
    fn log(&self) {
        if self.valid {
            tracing::info!(run_id = self.run_id, checked = self.checked, "{}", self);
        } else {
            tracing::warn!(
                run_id = self.run_id,
                checked = self.checked,
                mismatched = self.mismatched,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "manifest_verified",
            span_name = name,
            run_id = self.run_id,
            valid = self.valid,
        )
    }
}

/// One checkpoint's bytes no longer match its manifest entry.
///
/// # Log Level
/// `warn!` - Integrity problem, reported not raised
pub struct ChecksumMismatch<'a> {
    pub stage_id: &'a str,
    pub expected_hash: &'a str,
    pub actual_hash: &'a str,
}

impl Display for ChecksumMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Checkpoint {} does not match manifest: expected {}, found {}",
            self.stage_id, self.expected_hash, self.actual_hash
        )
    }
}

impl StructuredLog for ChecksumMismatch<'_> {
    fn log(&self) {
        tracing::warn!(
            stage_id = self.stage_id,
            expected_hash = self.expected_hash,
            actual_hash = self.actual_hash,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "checksum_mismatch",
            span_name = name,
            stage_id = self.stage_id,
        )
    }
}
