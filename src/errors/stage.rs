// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration errors raised by the stage dependency map and stage registry.
//!
//! These are always fatal: they describe a pipeline that cannot be executed as
//! configured, so they are raised synchronously and never retried.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// A stage number outside `[0, 10]`, a fractional number, NaN or an infinity.
    #[error("Invalid stage number: {value} (expected an integer in 0..=10)")]
    InvalidStageNumber { value: String },

    /// A second stage was registered for a number that is already taken.
    #[error("Stage {stage_number} is already registered (attempted to register '{stage_id}')")]
    DuplicateRegistration { stage_number: u8, stage_id: String },

    /// The stage id prefix does not agree with the stage's number.
    #[error("Stage id '{stage_id}' does not match stage number {stage_number} (expected prefix '{stage_number:02}_')")]
    IdMismatch { stage_number: u8, stage_id: String },

    /// The executor reached a stage number with nothing registered for it.
    #[error("No stage registered for stage number {stage_number}")]
    NotRegistered { stage_number: u8 },

    /// A resume range that ends before it starts.
    #[error("stop_after_stage {stop_after_stage} is before from_stage {from_stage}")]
    InvalidStopAfter { from_stage: u8, stop_after_stage: u8 },
}

impl StageError {
    pub fn invalid(value: impl std::fmt::Display) -> Self {
        StageError::InvalidStageNumber {
            value: value.to_string(),
        }
    }
}
