// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Candidate model and the pure algorithms that keep candidate data trustworthy.
//!
//! Everything in this module is synchronous and side-effect free: no file or
//! network I/O, no logging. The stages in `backends::local::stages` wrap these
//! functions, read their inputs from the upstream checkpoint and log summaries.
//!
//! * [`identity`] - content-derived candidate ids with collision resolution
//! * [`normalize`] - per-worker conversion of raw search results into candidates
//! * [`dedup`] - near-duplicate clustering and representative selection
//! * [`diversity`] - category-capped re-ranking and top-N truncation

pub mod dedup;
pub mod diversity;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod text;

pub use dedup::{deduplicate, Cluster, DedupResult, DedupStats};
pub use diversity::{select_diverse, DiversityResult, DiversityStats};
pub use identity::{ensure_unique_ids, generate_candidate_id, generate_candidate_ids};
pub use model::{Candidate, CandidateType, Confidence, Coordinates, Origin, SourceRef};
pub use normalize::{
    normalize_worker_results, parse_worker_outputs, NormalizationResult, NormalizationStats, WorkerOutput,
};
