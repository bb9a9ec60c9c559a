// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod candidate;
mod checkpoint;
mod config;
mod execution;
mod stage;

pub use candidate::CandidateError;
pub use checkpoint::{CheckpointError, CheckpointResult};
pub use config::ValidationError;
pub use execution::{ExecutionError, FailureStrategy};
pub use stage::StageError;
