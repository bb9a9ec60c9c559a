// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Storage and integrity errors for checkpoints and run manifests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    /// A checkpoint file that was expected on disk is missing.
    #[error("Checkpoint not found: {}", path.display())]
    CheckpointNotFound { path: PathBuf },

    /// A checkpoint file exists but is not a valid checkpoint envelope.
    #[error("Checkpoint at {} could not be parsed: {reason}", path.display())]
    CheckpointUnparsable { path: PathBuf, reason: String },

    /// The run has no manifest file.
    #[error("Manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The manifest file exists but is not valid manifest JSON.
    #[error("Manifest at {} could not be parsed: {reason}", path.display())]
    ManifestUnparsable { path: PathBuf, reason: String },

    /// Any other filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CheckpointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckpointError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;
