// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during run configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric setting falls outside its allowed range
    OutOfRange {
        /// Dotted path of the offending setting, e.g. `dedup.similarity_threshold`
        field: String,
        /// The value as written in the configuration
        value: String,
        /// Human readable description of the allowed range
        expected: String,
    },
    /// A required setting is empty
    EmptyValue {
        /// Dotted path of the offending setting
        field: String,
    },
    /// `stop_after_stage` does not name a pipeline stage
    InvalidStopStage {
        /// The configured value
        value: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Setting '{}' has value {} which is outside the allowed range {}",
                    field, value, expected
                )
            }
            ValidationError::EmptyValue { field } => {
                write!(f, "Setting '{}' must not be empty", field)
            }
            ValidationError::InvalidStopStage { value } => {
                write!(
                    f,
                    "stop_after_stage {} is not a pipeline stage (expected 0..=10)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
