// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;
pub mod stage_map;

pub use loader::{
    load_and_validate_config, load_config, DedupConfig, DiversityConfig, Limits, ModelChoices,
    RunConfig,
};
pub use runtime::RuntimeBuilder;
pub use stage_map::{StageNumber, LAST_STAGE, STAGE_COUNT};
pub use validation::validate_run_config;
