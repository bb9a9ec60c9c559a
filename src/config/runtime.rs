// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::LocalStageFactory;
use crate::checkpoint::CheckpointStore;
use crate::config::RunConfig;
use crate::engine::{ExecutorOptions, PipelineExecutor};
use crate::errors::StageError;

/// Pipeline runtime builder - assembles a registered executor and its options
/// from configuration.
///
/// Every stage number gets the built-in implementation from
/// [`LocalStageFactory`]; stages whose work lives in an external collaborator
/// get a passthrough placeholder. Checkpoints go under `data_root`.
///
/// # Examples
///
/// ```
/// use the_waypoint::config::{RuntimeBuilder, RunConfig};
///
/// let mut config = RunConfig::default();
/// config.stop_after_stage = Some(5);
///
/// let (executor, options) = RuntimeBuilder::from_config(&config).unwrap();
///
/// assert!(executor.registry().is_complete());
/// assert_eq!(options.stop_after_stage.map(|s| s.get()), Some(5));
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the executor and per-call options.
    ///
    /// # Returns
    /// A tuple of (PipelineExecutor, ExecutorOptions) ready for `execute` or
    /// `execute_from_stage`
    pub fn from_config(cfg: &RunConfig) -> Result<(PipelineExecutor, ExecutorOptions), StageError> {
        let options = ExecutorOptions::from_config(cfg)?;

        let mut executor = PipelineExecutor::new(CheckpointStore::new(cfg.data_root.clone()));
        for stage in LocalStageFactory::create_all() {
            executor.register_stage(stage)?;
        }

        Ok((executor, options))
    }
}
