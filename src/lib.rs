// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // built-in stages
pub mod candidates;    // candidate model + dedup/diversity algorithms
pub mod checkpoint;    // checkpoints, manifests, integrity
pub mod config;        // run config + stage map
pub mod engine;        // pipeline executor
pub mod errors;        // error handling
pub mod observability;
pub mod traits;        // stage contract
