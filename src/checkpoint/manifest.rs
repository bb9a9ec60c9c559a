// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run manifests: a content-addressed index of a run's checkpoints.
//!
//! At the end of a run the executor records, for every stage that produced a
//! checkpoint, the file's SHA-256 and size. [`CheckpointStore::verify_manifest`]
//! later recomputes both and reports, per stage, whether the bytes on disk are
//! still exactly the ones that were recorded.
//!
//! Integrity problems are *reported*, never raised: a tampered or deleted
//! checkpoint shows up as `matches: false` in the report. Only a missing or
//! unparsable manifest is an error.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

use super::hash::{calculate_file_hash, NOT_FOUND_SENTINEL};
use super::store::{atomic_write, checkpoint_filename, now_iso8601, CheckpointStore};
use crate::errors::{CheckpointError, CheckpointResult};
use crate::observability::messages::checkpoint::{ChecksumMismatch, ManifestSaved, ManifestVerified};
use crate::observability::messages::StructuredLog;

/// One row per executed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub stage_id: String,
    pub filename: String,
    pub sha256: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_stage: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub run_id: String,
    pub session_id: String,
    pub stages: Vec<ManifestEntry>,
    pub stages_executed: Vec<String>,
    pub stages_skipped: Vec<String>,
    pub final_stage: Option<String>,
    pub success: bool,
}

/// A stage that produced a checkpoint, and the stage whose output it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStage {
    pub stage_id: String,
    pub upstream_stage: Option<String>,
}

impl ExecutedStage {
    pub fn new(stage_id: impl Into<String>, upstream_stage: Option<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            upstream_stage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageVerification {
    pub stage_id: String,
    pub matches: bool,
    pub expected_hash: String,
    pub actual_hash: String,
    pub expected_size: u64,
    pub actual_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub session_id: String,
    pub run_id: String,
    pub valid: bool,
    pub stages: Vec<StageVerification>,
}

impl CheckpointStore {
    /// Hash and stat an already written checkpoint.
    pub async fn create_stage_entry(
        &self,
        session_id: &str,
        run_id: &str,
        stage_id: &str,
        upstream_stage: Option<String>,
    ) -> CheckpointResult<ManifestEntry> {
        let path = self.checkpoint_path(session_id, run_id, stage_id);
        let sha256 = calculate_file_hash(&path).await?;
        let size_bytes = tokio::fs::metadata(&path)
            .await
            .map_err(|e| CheckpointError::io(&path, e))?
            .len();

        Ok(ManifestEntry {
            stage_id: stage_id.to_string(),
            filename: checkpoint_filename(stage_id),
            sha256,
            size_bytes,
            upstream_stage,
            created_at: now_iso8601(),
        })
    }

    /// Build the manifest for a run, one entry per executed stage in the
    /// order given. Fails if any executed stage's checkpoint is missing.
    pub async fn generate_manifest(
        &self,
        session_id: &str,
        run_id: &str,
        executed: &[ExecutedStage],
        skipped: &[String],
        success: bool,
    ) -> CheckpointResult<Manifest> {
        let executed_ids: Vec<String> = executed.iter().map(|s| s.stage_id.clone()).collect();
        self.generate_run_manifest(session_id, run_id, executed, &executed_ids, skipped, success)
            .await
    }

    /// Like [`generate_manifest`](Self::generate_manifest), but the run's
    /// `stagesExecuted`/`finalStage` come from `executed_ids` rather than the
    /// checkpointed stages. Degraded stages run without leaving a checkpoint,
    /// so they appear in `executed_ids` and have no entry.
    pub async fn generate_run_manifest(
        &self,
        session_id: &str,
        run_id: &str,
        checkpointed: &[ExecutedStage],
        executed_ids: &[String],
        skipped: &[String],
        success: bool,
    ) -> CheckpointResult<Manifest> {
        let mut stages = Vec::with_capacity(checkpointed.len());
        for stage in checkpointed {
            let entry = self
                .create_stage_entry(session_id, run_id, &stage.stage_id, stage.upstream_stage.clone())
                .await?;
            stages.push(entry);
        }

        Ok(Manifest {
            run_id: run_id.to_string(),
            session_id: session_id.to_string(),
            stages,
            stages_executed: executed_ids.to_vec(),
            stages_skipped: skipped.to_vec(),
            final_stage: executed_ids.last().cloned(),
            success,
        })
    }

    pub async fn save_manifest(&self, manifest: &Manifest) -> CheckpointResult<PathBuf> {
        let path = self.manifest_path(&manifest.session_id, &manifest.run_id);
        let bytes = serde_json::to_vec_pretty(manifest)?;
        atomic_write(&path, &bytes).await?;

        ManifestSaved {
            run_id: &manifest.run_id,
            path: &path,
            entries: manifest.stages.len(),
        }
        .log();

        Ok(path)
    }

    /// Load a run's manifest; `Ok(None)` when the run has none.
    pub async fn load_manifest(&self, session_id: &str, run_id: &str) -> CheckpointResult<Option<Manifest>> {
        let path = self.manifest_path(session_id, run_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::io(path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CheckpointError::ManifestUnparsable {
                path,
                reason: e.to_string(),
            })
    }

    /// Recompute every checkpoint's hash and size against the manifest.
    pub async fn verify_manifest(&self, session_id: &str, run_id: &str) -> CheckpointResult<VerificationReport> {
        let manifest = self
            .load_manifest(session_id, run_id)
            .await?
            .ok_or_else(|| CheckpointError::ManifestNotFound {
                path: self.manifest_path(session_id, run_id),
            })?;

        let run_dir = self.run_dir(session_id, run_id);
        let mut stages = Vec::with_capacity(manifest.stages.len());

        for entry in &manifest.stages {
            let path = run_dir.join(&entry.filename);
            let (actual_hash, actual_size) = match calculate_file_hash(&path).await {
                Ok(hash) => {
                    let size = tokio::fs::metadata(&path)
                        .await
                        .map_err(|e| CheckpointError::io(&path, e))?
                        .len();
                    (hash, Some(size))
                }
                Err(CheckpointError::CheckpointNotFound { .. }) => (NOT_FOUND_SENTINEL.to_string(), None),
                Err(other) => return Err(other),
            };

            let matches = actual_hash == entry.sha256 && actual_size == Some(entry.size_bytes);
            if !matches {
                ChecksumMismatch {
                    stage_id: &entry.stage_id,
                    expected_hash: &entry.sha256,
                    actual_hash: &actual_hash,
                }
                .log();
            }

            stages.push(StageVerification {
                stage_id: entry.stage_id.clone(),
                matches,
                expected_hash: entry.sha256.clone(),
                actual_hash,
                expected_size: entry.size_bytes,
                actual_size,
            });
        }

        let mismatched = stages.iter().filter(|s| !s.matches).count();
        let valid = mismatched == 0;
        ManifestVerified {
            run_id,
            valid,
            checked: stages.len(),
            mismatched,
        }
        .log();

        Ok(VerificationReport {
            session_id: session_id.to_string(),
            run_id: run_id.to_string(),
            valid,
            stages,
        })
    }
}
