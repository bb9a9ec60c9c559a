// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! SHA-256 content hashing for checkpoint files.

use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::errors::{CheckpointError, CheckpointResult};

/// Reported as the actual hash of a checkpoint that no longer exists.
pub const NOT_FOUND_SENTINEL: &str = "not_found";

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-256 and return the lowercase hex digest.
///
/// The result is identical to [`hash_bytes`] over the file's full contents no
/// matter how reads are chunked. A missing file is reported as
/// [`CheckpointError::CheckpointNotFound`].
pub async fn calculate_file_hash(path: &Path) -> CheckpointResult<String> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => CheckpointError::CheckpointNotFound {
            path: path.to_path_buf(),
        },
        _ => CheckpointError::io(path, e),
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| CheckpointError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA-256 of an in-memory buffer as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
