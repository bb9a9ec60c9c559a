// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod context;
pub mod cost;
pub mod executor;
pub mod registry;
pub mod result;
#[cfg(test)]
pub mod integration_tests;

pub use context::StageContext;
pub use cost::{CostSnapshot, CostTracker, CostUsage, StageCost};
pub use executor::{ExecutorOptions, PipelineExecutor};
pub use registry::StageRegistry;
pub use result::{RunResult, RunState, RunTiming, StageErrorRecord, StageStatus};
