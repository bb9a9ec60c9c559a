// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Diversity-constrained selection over a score-sorted candidate list.
//!
//! Within the leading window no type and no destination may exceed its cap.
//! When the next item would break a cap it is deferred and the first later
//! item that fits is pulled up instead. If nothing later fits, the next item
//! is taken anyway, so a single-category list passes through unchanged.
//! Items inside the same category keep their relative order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::model::{Candidate, CandidateType};
use crate::config::DiversityConfig;

/// Key used in `byDestination` for candidates without a destination.
const UNKNOWN_DESTINATION: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityStats {
    pub input_count: usize,
    pub output_count: usize,
    pub deferred_count: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_destination: BTreeMap<String, usize>,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityResult {
    pub candidates: Vec<Candidate>,
    pub stats: DiversityStats,
}

/// Reorder `candidates` (already sorted by descending score) under the
/// window caps in `config`, then keep the first `config.top_n`.
pub fn select_diverse(candidates: &[Candidate], config: &DiversityConfig) -> DiversityResult {
    let destinations: Vec<Option<String>> = candidates.iter().map(Candidate::destination).collect();
    let order = diversified_order(candidates, &destinations, config);

    let window = config.window_size.min(candidates.len());
    let deferred_count = order[..window]
        .iter()
        .enumerate()
        .filter(|&(position, &index)| position != index)
        .count();

    let selected: Vec<usize> = order.into_iter().take(config.top_n).collect();

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_destination: BTreeMap<String, usize> = BTreeMap::new();
    for &index in &selected {
        *by_type
            .entry(candidates[index].candidate_type.as_str().to_string())
            .or_default() += 1;
        let destination = destinations[index]
            .clone()
            .unwrap_or_else(|| UNKNOWN_DESTINATION.to_string());
        *by_destination.entry(destination).or_default() += 1;
    }

    let selected: Vec<Candidate> = selected.into_iter().map(|i| candidates[i].clone()).collect();
    let (average_score, min_score, max_score) = score_summary(&selected);

    DiversityResult {
        stats: DiversityStats {
            input_count: candidates.len(),
            output_count: selected.len(),
            deferred_count,
            by_type,
            by_destination,
            average_score,
            min_score,
            max_score,
            top_n: config.top_n,
        },
        candidates: selected,
    }
}

/// Returns input indices in their post-diversity order.
fn diversified_order(
    candidates: &[Candidate],
    destinations: &[Option<String>],
    config: &DiversityConfig,
) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut order = Vec::with_capacity(candidates.len());
    let mut type_counts: HashMap<CandidateType, usize> = HashMap::new();
    let mut destination_counts: HashMap<&str, usize> = HashMap::new();

    while order.len() < config.window_size && !remaining.is_empty() {
        let fits = |index: usize| {
            let type_ok = type_counts
                .get(&candidates[index].candidate_type)
                .copied()
                .unwrap_or(0)
                < config.max_per_type;
            let destination_ok = match destinations[index].as_deref() {
                Some(destination) => {
                    destination_counts.get(destination).copied().unwrap_or(0) < config.max_per_destination
                }
                None => true,
            };
            type_ok && destination_ok
        };

        let position = remaining.iter().position(|&i| fits(i)).unwrap_or(0);
        let index = remaining.remove(position);

        *type_counts.entry(candidates[index].candidate_type).or_default() += 1;
        if let Some(destination) = destinations[index].as_deref() {
            *destination_counts.entry(destination).or_default() += 1;
        }
        order.push(index);
    }

    order.extend(remaining);
    order
}

fn score_summary(selected: &[Candidate]) -> (f64, f64, f64) {
    if selected.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let total: f64 = selected.iter().map(|c| c.score).sum();
    let min = selected.iter().map(|c| c.score).fold(f64::INFINITY, f64::min);
    let max = selected.iter().map(|c| c.score).fold(f64::NEG_INFINITY, f64::max);
    (total / selected.len() as f64, min, max)
}
