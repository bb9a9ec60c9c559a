// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! On-disk checkpoint storage.
//!
//! Layout under the configured data root:
//!
//! ```text
//! <data_root>/<session_id>/runs/<run_id>/<stage_id>.json   one per stage
//! <data_root>/<session_id>/runs/<run_id>/manifest.json     one per run
//! ```
//!
//! Every file is written through [`atomic_write`], so a concurrent reader sees
//! either the previous file or the complete new one, never a partial write.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::consts::CHECKPOINT_SCHEMA_VERSION;
use crate::config::stage_map::StageNumber;
use crate::errors::{CheckpointError, CheckpointResult};
use crate::observability::messages::checkpoint::CheckpointWritten;
use crate::observability::messages::StructuredLog;

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Envelope metadata written in front of every checkpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointMeta {
    pub stage_id: String,
    pub stage_number: u8,
    pub stage_name: String,
    pub schema_version: u32,
    pub session_id: String,
    pub run_id: String,
    pub created_at: String,
}

/// A persisted stage output: `{ "_meta": {...}, "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "_meta")]
    pub meta: CheckpointMeta,
    pub data: Value,
}

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads and writes checkpoints and manifests below one data root.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    data_root: PathBuf,
}

impl CheckpointStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn run_dir(&self, session_id: &str, run_id: &str) -> PathBuf {
        self.data_root.join(session_id).join("runs").join(run_id)
    }

    pub fn checkpoint_path(&self, session_id: &str, run_id: &str, stage_id: &str) -> PathBuf {
        self.run_dir(session_id, run_id).join(checkpoint_filename(stage_id))
    }

    pub fn manifest_path(&self, session_id: &str, run_id: &str) -> PathBuf {
        self.run_dir(session_id, run_id).join(MANIFEST_FILENAME)
    }

    /// Wrap `data` in a checkpoint envelope and persist it atomically.
    ///
    /// Returns the path of the written file.
    pub async fn write_checkpoint(
        &self,
        session_id: &str,
        run_id: &str,
        stage: StageNumber,
        data: &Value,
    ) -> CheckpointResult<PathBuf> {
        let stage_id = stage.id();
        let checkpoint = Checkpoint {
            meta: CheckpointMeta {
                stage_id: stage_id.clone(),
                stage_number: stage.get(),
                stage_name: stage.name().to_string(),
                schema_version: CHECKPOINT_SCHEMA_VERSION,
                session_id: session_id.to_string(),
                run_id: run_id.to_string(),
                created_at: now_iso8601(),
            },
            data: data.clone(),
        };

        let bytes = serde_json::to_vec_pretty(&checkpoint)?;
        let path = self.checkpoint_path(session_id, run_id, &stage_id);
        atomic_write(&path, &bytes).await?;

        CheckpointWritten {
            stage_id: &stage_id,
            path: &path,
            size_bytes: bytes.len() as u64,
        }
        .log();

        Ok(path)
    }

    /// Load a checkpoint, distinguishing "missing" from "unparsable".
    pub async fn read_checkpoint(
        &self,
        session_id: &str,
        run_id: &str,
        stage_id: &str,
    ) -> CheckpointResult<Checkpoint> {
        let path = self.checkpoint_path(session_id, run_id, stage_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckpointError::CheckpointNotFound { path })
            }
            Err(e) => return Err(CheckpointError::io(path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| CheckpointError::CheckpointUnparsable {
            path,
            reason: e.to_string(),
        })
    }

    pub async fn checkpoint_exists(&self, session_id: &str, run_id: &str, stage_id: &str) -> bool {
        tokio::fs::try_exists(self.checkpoint_path(session_id, run_id, stage_id))
            .await
            .unwrap_or(false)
    }
}

pub fn checkpoint_filename(stage_id: &str) -> String {
    format!("{}.json", stage_id)
}

/// Write `bytes` to `path` so that readers never observe a partial file.
///
/// The bytes go to a uniquely named temp file in the same directory, are
/// flushed to disk, and the temp file is then renamed over the target.
pub async fn atomic_write(path: &Path, bytes: &[u8]) -> CheckpointResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| CheckpointError::io(parent, e))?;

    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("checkpoint");
    let tmp = parent.join(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));

    if let Err(error) = write_and_sync(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(error);
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CheckpointError::io(path, e));
    }

    Ok(())
}

async fn write_and_sync(tmp: &Path, bytes: &[u8]) -> CheckpointResult<()> {
    let mut file = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| CheckpointError::io(tmp, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| CheckpointError::io(tmp, e))?;
    file.sync_all().await.map_err(|e| CheckpointError::io(tmp, e))?;
    Ok(())
}
