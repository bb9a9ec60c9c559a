// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential pipeline executor with checkpointing, resume and degraded mode.
//!
//! Stages run strictly one after another in ascending number order: stage
//! *n+1* consumes the output of stage *n*, and its checkpoint is on disk
//! before the next stage starts. Concurrency, if any, lives inside a stage.
//!
//! # Failure handling
//!
//! A stage returning an error is handled according to
//! [`ExecutorOptions::continue_on_error`]:
//!
//! * **fail fast** (default): the run stops, `success` is false and the
//!   failing stage is *not* listed in `stages_executed`
//! * **continue on error**: the error is recorded with `continued: true`, the
//!   stage is marked degraded, and the next stage receives the output of the
//!   last stage that succeeded
//!
//! Configuration problems (an unregistered stage, a stop stage before the
//! resume stage) and storage problems (a checkpoint that cannot be written or a
//! resume source that cannot be read) are never absorbed. They end the call
//! with an [`ExecutionError`].
//!
//! # Persistence
//!
//! Unless `dry_run` is set, every successful stage's data is written as a
//! checkpoint, and a manifest covering those checkpoints is saved at the end
//! of the run whether it succeeded or not. Degraded stages produce no
//! checkpoint and therefore no manifest entry.
//!
//! # Resume
//!
//! [`PipelineExecutor::execute_from_stage`] skips every stage before
//! `from_stage` and seeds the run with the checkpoint of `from_stage - 1` read
//! from the source run. The new run writes into its own run directory.
//!
//! # Examples
//!
//! ```rust
//! use the_waypoint::backends::local::LocalStageFactory;
//! use the_waypoint::checkpoint::CheckpointStore;
//! use the_waypoint::config::RunConfig;
//! use the_waypoint::engine::{ExecutorOptions, PipelineExecutor, StageContext};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let mut config = RunConfig::default();
//! config.data_root = dir.path().to_path_buf();
//!
//! let mut executor = PipelineExecutor::new(CheckpointStore::new(dir.path()));
//! for stage in LocalStageFactory::create_all() {
//!     executor.register_stage(stage)?;
//! }
//!
//! let ctx = StageContext::new("session-1", "run-1", config);
//! let result = executor.execute(&ctx, &ExecutorOptions::default()).await?;
//! assert!(result.success);
//! assert_eq!(result.stages_executed.len(), 11);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::registry::StageRegistry;
use super::result::{RunResult, RunState, RunTiming, StageErrorRecord, StageStatus};
use super::StageContext;
use crate::checkpoint::{CheckpointStore, ExecutedStage};
use crate::config::stage_map::{self, IntoStageNumber, StageNumber};
use crate::config::RunConfig;
use crate::errors::{ExecutionError, StageError};
use crate::observability::messages::checkpoint::CheckpointLoaded;
use crate::observability::messages::executor::{
    ResumeStarted, RunCompleted, RunFailed, RunStarted, StageDegraded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ExecutionObserver, Stage, TracingObserver, UpstreamOutput};

/// Per-call execution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorOptions {
    /// Last stage to run; `None` runs through the final stage.
    pub stop_after_stage: Option<StageNumber>,
    /// Run stage logic without writing checkpoints or a manifest.
    pub dry_run: bool,
    pub continue_on_error: bool,
}

impl ExecutorOptions {
    /// Options as described by a run configuration.
    pub fn from_config(config: &RunConfig) -> Result<Self, StageError> {
        let stop_after_stage = config
            .stop_after_stage
            .map(|s| s.into_stage_number())
            .transpose()?;

        Ok(Self {
            stop_after_stage,
            dry_run: config.dry_run,
            continue_on_error: config.failure_strategy.continues_on_error(),
        })
    }

    fn last_stage(&self) -> StageNumber {
        self.stop_after_stage.unwrap_or(StageNumber::LAST)
    }
}

/// Runs registered stages in order and records what happened.
pub struct PipelineExecutor {
    registry: StageRegistry,
    store: CheckpointStore,
    observer: Arc<dyn ExecutionObserver>,
}

/// Mutable bookkeeping for one run.
#[derive(Default)]
struct RunLedger {
    state: RunState,
    executed: Vec<String>,
    checkpointed: Vec<ExecutedStage>,
    errors: Vec<StageErrorRecord>,
    degraded: Vec<String>,
    per_stage: BTreeMap<String, u64>,
    status: BTreeMap<String, StageStatus>,
}

impl PipelineExecutor {
    pub fn new(store: CheckpointStore) -> Self {
        Self {
            registry: StageRegistry::new(),
            store,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn register_stage(&mut self, stage: Arc<dyn Stage>) -> Result<(), StageError> {
        self.registry.register(stage)
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Run stages `0..=stop_after_stage` from scratch.
    pub async fn execute(
        &self,
        ctx: &StageContext,
        options: &ExecutorOptions,
    ) -> Result<RunResult, ExecutionError> {
        let stages = StageNumber::range(StageNumber::FIRST, options.last_stage());
        let started = RunStarted {
            session_id: &ctx.session_id,
            run_id: &ctx.run_id,
            first_stage: StageNumber::FIRST.get(),
            last_stage: options.last_stage().get(),
        };
        started.log();
        let span = started.span("pipeline_run");

        self.run_stages(ctx, stages, Vec::new(), None, options)
            .instrument(span)
            .await
    }

    /// Resume: skip everything before `from_stage`, seed the run with the
    /// `from_stage - 1` checkpoint of `source_run_id`, then run as usual.
    pub async fn execute_from_stage(
        &self,
        ctx: &StageContext,
        from_stage: impl IntoStageNumber,
        source_run_id: &str,
        options: &ExecutorOptions,
    ) -> Result<RunResult, ExecutionError> {
        let from = from_stage.into_stage_number()?;
        let last = options.last_stage();
        if last < from {
            return Err(StageError::InvalidStopAfter {
                from_stage: from.get(),
                stop_after_stage: last.get(),
            }
            .into());
        }

        let skipped: Vec<String> = stage_map::skip_set_for_resume(from)?
            .into_iter()
            .map(StageNumber::id)
            .collect();
        let stages: Vec<StageNumber> = stage_map::execute_set_for_resume(from)?
            .into_iter()
            .filter(|s| *s <= last)
            .collect();

        let resume = ResumeStarted {
            run_id: &ctx.run_id,
            source_run_id,
            from_stage: from.get(),
            skipped: skipped.len(),
        };
        resume.log();
        let span = resume.span("pipeline_resume");

        async {
            for stage_id in &skipped {
                self.observer.on_stage_skip(stage_id);
            }
            let initial = self.load_resume_input(ctx, from, source_run_id).await?;
            self.run_stages(ctx, stages, skipped.clone(), initial, options).await
        }
        .instrument(span)
        .await
    }

    async fn load_resume_input(
        &self,
        ctx: &StageContext,
        from: StageNumber,
        source_run_id: &str,
    ) -> Result<Option<UpstreamOutput>, ExecutionError> {
        let Some(previous) = from.previous() else {
            return Ok(None);
        };
        let stage_id = previous.id();

        let checkpoint = self
            .store
            .read_checkpoint(&ctx.session_id, source_run_id, &stage_id)
            .await
            .map_err(|e| ExecutionError::ResumeCheckpointMissing {
                stage_id: stage_id.clone(),
                source_run_id: source_run_id.to_string(),
                reason: e.to_string(),
            })?;

        CheckpointLoaded {
            stage_id: &stage_id,
            path: &self.store.checkpoint_path(&ctx.session_id, source_run_id, &stage_id),
        }
        .log();

        Ok(Some(UpstreamOutput {
            stage_id,
            data: checkpoint.data,
        }))
    }

    async fn run_stages(
        &self,
        ctx: &StageContext,
        stages: Vec<StageNumber>,
        skipped: Vec<String>,
        initial: Option<UpstreamOutput>,
        options: &ExecutorOptions,
    ) -> Result<RunResult, ExecutionError> {
        let run_start = Instant::now();
        let mut ledger = RunLedger {
            state: RunState::Running,
            ..RunLedger::default()
        };
        for stage_id in &skipped {
            ledger.status.insert(stage_id.clone(), StageStatus::Skipped);
        }
        for stage in &stages {
            ledger.status.insert(stage.id(), StageStatus::Pending);
        }

        let mut last_success = initial;

        for number in stages {
            let stage = self.registry.get(number)?;
            let stage_id = stage.id();

            self.observer.on_stage_start(&stage_id);
            ledger.status.insert(stage_id.clone(), StageStatus::Running);

            let stage_ctx = ctx.for_stage(number);
            let stage_start = Instant::now();
            let outcome = stage.execute(&stage_ctx, last_success.as_ref()).await;
            let elapsed = stage_start.elapsed();
            ledger.per_stage.insert(stage_id.clone(), elapsed.as_millis() as u64);

            match outcome {
                Ok(output) => {
                    self.observer.on_stage_complete(&stage_id, elapsed);

                    if !options.dry_run {
                        self.store
                            .write_checkpoint(&ctx.session_id, &ctx.run_id, number, &output.data)
                            .await?;
                        ledger.checkpointed.push(ExecutedStage::new(
                            stage_id.clone(),
                            last_success.as_ref().map(|u| u.stage_id.clone()),
                        ));
                    }

                    ledger.executed.push(stage_id.clone());
                    ledger.status.insert(stage_id.clone(), StageStatus::Completed);
                    last_success = Some(UpstreamOutput {
                        stage_id,
                        data: output.data,
                    });
                }
                Err(error) => {
                    let message = error.to_string();
                    self.observer.on_stage_error(&stage_id, &message);

                    if options.continue_on_error {
                        StageDegraded {
                            stage_id: &stage_id,
                            input_from: last_success.as_ref().map(|u| u.stage_id.as_str()),
                        }
                        .log();
                        ledger.errors.push(StageErrorRecord {
                            stage_id: stage_id.clone(),
                            error: message,
                            continued: true,
                        });
                        ledger.executed.push(stage_id.clone());
                        ledger.degraded.push(stage_id.clone());
                        ledger.status.insert(stage_id, StageStatus::Degraded);
                    } else {
                        RunFailed {
                            run_id: &ctx.run_id,
                            stage_id: &stage_id,
                            error: &message,
                        }
                        .log();
                        ledger.errors.push(StageErrorRecord {
                            stage_id: stage_id.clone(),
                            error: message,
                            continued: false,
                        });
                        ledger.status.insert(stage_id, StageStatus::Failed);
                        ledger.state = RunState::Failed;
                        break;
                    }
                }
            }
        }

        if ledger.state == RunState::Running {
            ledger.state = RunState::Completed;
        }
        let success = ledger.state == RunState::Completed;

        if !options.dry_run {
            let manifest = self
                .store
                .generate_run_manifest(
                    &ctx.session_id,
                    &ctx.run_id,
                    &ledger.checkpointed,
                    &ledger.executed,
                    &skipped,
                    success,
                )
                .await?;
            self.store.save_manifest(&manifest).await?;
        }

        let duration = run_start.elapsed();
        if success {
            RunCompleted {
                run_id: &ctx.run_id,
                stages_executed: ledger.executed.len(),
                degraded_stages: ledger.degraded.len(),
                duration,
            }
            .log();
        }

        Ok(RunResult {
            session_id: ctx.session_id.clone(),
            run_id: ctx.run_id.clone(),
            state: ledger.state,
            success,
            final_stage: ledger.executed.last().cloned(),
            stages_executed: ledger.executed,
            stages_skipped: skipped,
            errors: ledger.errors,
            degraded_stages: ledger.degraded,
            timing: RunTiming {
                duration_ms: duration.as_millis() as u64,
                per_stage: ledger.per_stage,
            },
            stage_status: ledger.status,
            costs: ctx.costs().snapshot(),
            output: last_success.map(|u| u.data),
        })
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("registry", &self.registry)
            .field("store", &self.store)
            .finish()
    }
}
