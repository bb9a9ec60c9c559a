// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at the right level with its fields attached.
//!
//! # Organization
//!
//! * `executor` - run and stage lifecycle events
//! * `checkpoint` - checkpoint persistence and manifest integrity events
//! * `stage` - stage factory and in-stage events
//! * `validation` - configuration validation errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_waypoint::observability::messages::executor::RunStarted;
//! use the_waypoint::observability::messages::StructuredLog;
//!
//! let msg = RunStarted {
//!     session_id: "session-1",
//!     run_id: "run-1",
//!     first_stage: 0,
//!     last_stage: 10,
//! };
//!
//! msg.log();
//! let _span = msg.span("discovery_run");
//! ```

use tracing::Span;

pub mod checkpoint;
pub mod executor;
pub mod stage;
pub mod validation;

/// Emits a message as a structured tracing event or span.
///
/// `log` picks the level that fits the message; `span` opens a span carrying
/// the same fields so nested events inherit them.
pub trait StructuredLog {
    fn log(&self);
    fn span(&self, name: &str) -> Span;
}
