// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Checkpoint persistence and manifest integrity.
//!
//! * [`store`] - checkpoint envelopes, on-disk layout, atomic writes
//! * [`hash`] - streaming SHA-256 of checkpoint files
//! * [`manifest`] - per-run manifests and their verification

pub mod hash;
pub mod manifest;
pub mod store;


pub use hash::{calculate_file_hash, hash_bytes, NOT_FOUND_SENTINEL};
pub use manifest::{ExecutedStage, Manifest, ManifestEntry, StageVerification, VerificationReport};
pub use store::{atomic_write, Checkpoint, CheckpointMeta, CheckpointStore};
