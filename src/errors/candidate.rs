// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while reading or validating candidate payloads inside a stage.
#[derive(Error, Debug)]
pub enum CandidateError {
    /// The upstream payload does not have the shape this stage consumes.
    #[error("Malformed {stage} input: {reason}")]
    MalformedInput { stage: &'static str, reason: String },

    /// A candidate violates one of the model invariants.
    #[error("Candidate '{candidate_id}' is invalid: {reason}")]
    InvalidCandidate { candidate_id: String, reason: String },

    #[error("Candidate payload error: {0}")]
    Json(#[from] serde_json::Error),
}
