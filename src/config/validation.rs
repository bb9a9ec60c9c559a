//! Run configuration validation.
//!
//! Validation accumulates every problem it finds so that an operator sees all
//! of them at once instead of fixing one setting per attempt. Each check is a
//! small function returning the errors it found; [`validate_run_config`] runs
//! them all and merges the results.
//!
//! # Checks
//!
//! 1. **Storage**: `data_root` must not be empty
//! 2. **Stage range**: `stop_after_stage`, when set, must name a pipeline stage
//! 3. **Dedup tuning**: `similarity_threshold` must lie in `(0, 1]`
//! 4. **Diversity tuning**: window, caps and `top_n` must all be at least 1
//! 5. **Limits**: worker limits must be at least 1
//!
//! # Examples
//!
//! ```rust
//! use the_waypoint::config::{validate_run_config, RunConfig};
//!
//! let mut config = RunConfig::default();
//! assert!(validate_run_config(&config).is_ok());
//!
//! config.diversity.top_n = 0;
//! config.dedup.similarity_threshold = 2.0;
//! let errors = validate_run_config(&config).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use crate::config::stage_map::IntoStageNumber;
use crate::config::RunConfig;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{ConfigValidationFailed, ValidationFailed};
use crate::observability::messages::StructuredLog;

/// Validates a run configuration, returning every problem found.
pub fn validate_run_config(config: &RunConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_storage(config));
    errors.extend(validate_stop_stage(config));
    errors.extend(validate_dedup(config));
    errors.extend(validate_diversity(config));
    errors.extend(validate_limits(config));

    for error in &errors {
        ConfigValidationFailed { error }.log();
    }

    if errors.is_empty() {
        Ok(())
    } else {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn validate_storage(config: &RunConfig) -> Vec<ValidationError> {
    if config.data_root.as_os_str().is_empty() {
        vec![ValidationError::EmptyValue {
            field: "data_root".to_string(),
        }]
    } else {
        Vec::new()
    }
}

fn validate_stop_stage(config: &RunConfig) -> Vec<ValidationError> {
    match config.stop_after_stage {
        Some(stage) if stage.into_stage_number().is_err() => {
            vec![ValidationError::InvalidStopStage {
                value: stage.to_string(),
            }]
        }
        _ => Vec::new(),
    }
}

fn validate_dedup(config: &RunConfig) -> Vec<ValidationError> {
    let threshold = config.dedup.similarity_threshold;
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Vec::new()
    } else {
        vec![ValidationError::OutOfRange {
            field: "dedup.similarity_threshold".to_string(),
            value: threshold.to_string(),
            expected: "(0, 1]".to_string(),
        }]
    }
}

fn validate_diversity(config: &RunConfig) -> Vec<ValidationError> {
    let diversity = &config.diversity;
    [
        ("diversity.window_size", diversity.window_size),
        ("diversity.max_per_type", diversity.max_per_type),
        ("diversity.max_per_destination", diversity.max_per_destination),
        ("diversity.top_n", diversity.top_n),
    ]
    .into_iter()
    .filter(|(_, value)| *value == 0)
    .map(|(field, value)| at_least_one(field, value))
    .collect()
}

fn validate_limits(config: &RunConfig) -> Vec<ValidationError> {
    let limits = &config.limits;
    [
        ("limits.max_candidates_per_worker", limits.max_candidates_per_worker),
        ("limits.max_worker_queries", limits.max_worker_queries),
    ]
    .into_iter()
    .filter(|(_, value)| *value == 0)
    .map(|(field, value)| at_least_one(field, value))
    .collect()
}

fn at_least_one(field: &str, value: usize) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: ">= 1".to_string(),
    }
}
