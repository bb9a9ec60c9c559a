// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic event is a small message struct implementing `Display`
//! and [`messages::StructuredLog`], so log text lives in one place and each
//! event carries its fields as structured tracing attributes.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::executor` - run and per-stage lifecycle events
//! * `messages::checkpoint` - checkpoint, manifest and verification events
//! * `messages::stage` - events raised inside individual stages and the stage factory
//! * `messages::validation` - configuration validation errors
//!
//! The pure candidate algorithms never log; the stages wrapping them do.
//!
//! # Usage
//!
//! ```rust
//! use the_waypoint::observability::messages::executor::StageSkipped;
//! use the_waypoint::observability::messages::StructuredLog;
//!
//! StageSkipped { stage_id: "03_workers" }.log();
//! ```

pub mod messages;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// Logs go to stderr so that stdout stays reserved for the JSON reports the
/// binary prints. Only binaries call this; the library never installs a
/// subscriber on its own. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
