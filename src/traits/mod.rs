// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod observer;
pub mod stage;

pub use observer::{ExecutionObserver, TracingObserver};
pub use stage::{Stage, StageMetadata, StageOutput, StageTimer, StageTiming, UpstreamOutput};
