// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_DATA_ROOT, DEFAULT_DIVERSITY_WINDOW, DEFAULT_MAX_CANDIDATES_PER_WORKER,
    DEFAULT_MAX_PER_DESTINATION, DEFAULT_MAX_PER_TYPE, DEFAULT_MAX_WORKER_QUERIES,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_N,
};
use crate::errors::FailureStrategy;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration for the discovery pipeline.
///
/// Every field has a default, so an empty file is a valid configuration.
/// The same structure is snapshotted into each stage's checkpoint metadata,
/// which is why it is both `Serialize` and `Deserialize`.
///
/// # Fields
/// * `data_root` - Directory under which sessions, runs and checkpoints live
/// * `failure_strategy` - What to do when a stage fails (defaults to FailFast)
/// * `stop_after_stage` - Last stage to execute (defaults to the final stage)
/// * `dry_run` - Execute stage logic without persisting checkpoints
/// * `limits` - Upper bounds applied by worker-facing stages
/// * `models` - Model choices passed through to LLM-backed collaborators
/// * `dedup` - Deduplication/clustering tuning
/// * `diversity` - Diversity-constrained selection tuning
///
/// # Example
/// ```yaml
/// data_root: ./data
/// failure_strategy: continue_on_error
/// stop_after_stage: 8
/// dedup:
///   similarity_threshold: 0.7
/// diversity:
///   window_size: 20
///   max_per_type: 8
///   max_per_destination: 6
///   top_n: 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data_root: PathBuf,
    pub failure_strategy: FailureStrategy,
    pub stop_after_stage: Option<i64>,
    pub dry_run: bool,
    pub limits: Limits,
    pub models: ModelChoices,
    pub dedup: DedupConfig,
    pub diversity: DiversityConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            failure_strategy: FailureStrategy::default(),
            stop_after_stage: None,
            dry_run: false,
            limits: Limits::default(),
            models: ModelChoices::default(),
            dedup: DedupConfig::default(),
            diversity: DiversityConfig::default(),
        }
    }
}

/// Upper bounds applied by the stages that talk to search workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_candidates_per_worker: usize,
    pub max_worker_queries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_candidates_per_worker: DEFAULT_MAX_CANDIDATES_PER_WORKER,
            max_worker_queries: DEFAULT_MAX_WORKER_QUERIES,
        }
    }
}

/// Model identifiers handed to the LLM-backed stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelChoices {
    pub enhancement: String,
    pub aggregation: String,
}

impl Default for ModelChoices {
    fn default() -> Self {
        Self {
            enhancement: "default".to_string(),
            aggregation: "default".to_string(),
        }
    }
}

/// Deduplication tuning.
///
/// `similarity_threshold` is the Jaccard similarity over normalized
/// title/location tokens at or above which two candidates merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub similarity_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Diversity-constrained selection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub window_size: usize,
    pub max_per_type: usize,
    pub max_per_destination: usize,
    pub top_n: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_DIVERSITY_WINDOW,
            max_per_type: DEFAULT_MAX_PER_TYPE,
            max_per_destination: DEFAULT_MAX_PER_DESTINATION,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Load a config from a YAML or TOML file, chosen by extension
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<RunConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let cfg: RunConfig = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        other => bail!(
            "Unsupported config format {:?} for {} (expected .yaml, .yml or .toml)",
            other.unwrap_or(""),
            path.display()
        ),
    };
    Ok(cfg)
}

/// Load and validate a config file
///
/// All validation problems are reported together in a single error message.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> anyhow::Result<RunConfig> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_run_config(&cfg) {
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        bail!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        );
    }

    Ok(cfg)
}
