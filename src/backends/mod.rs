// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage backend implementations for the discovery pipeline.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust stages:
//! - **Normalization**: raw worker output into identified candidates (stage 4)
//! - **Deduplication**: near-duplicate clustering (stage 5)
//! - **Selection**: diversity-capped top-N (stage 8)
//! - **Passthrough**: placeholders for stages owned by external collaborators
//!
//! ## Stub Backend (Test-Only)
//! Testing utilities for executor development (only available in test builds):
//! - **StubStage**: succeeds and reports which upstream output it saw
//! - **FailingStage**: fails with a fixed message
//! - **RecordingObserver**: records lifecycle callbacks in order
//!
//! # Architecture
//!
//! ```text
//! Stage number -> LocalStageFactory -> Arc<dyn Stage> -> StageRegistry -> PipelineExecutor
//! ```
//!
//! # Examples
//!
//! ```rust
//! use the_waypoint::backends::local::LocalStageFactory;
//! use the_waypoint::config::StageNumber;
//! use the_waypoint::traits::Stage;
//!
//! let stage = LocalStageFactory::create(StageNumber::DEDUPE);
//! assert_eq!(stage.id(), "05_dedupe");
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
