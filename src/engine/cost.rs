// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-stage cost accounting.
//!
//! One [`CostTracker`] is shared by every stage of a run. Each stage only
//! ever writes to its own slot, through the [`StageContext`] it was handed,
//! so there is no process-wide "current stage". Counters are atomics, which
//! lets parallel sub-tasks inside one stage record usage without locking.
//!
//! [`StageContext`]: crate::engine::StageContext

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::stage_map::{StageNumber, STAGE_COUNT};

const MICROS_PER_USD: f64 = 1_000_000.0;

/// One increment of usage reported by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CostUsage {
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub api_calls: u64,
    pub cost_micro_usd: u64,
}

impl CostUsage {
    /// A single API call with its token counts and price in US dollars.
    pub fn api_call(tokens_in: u64, tokens_out: u64, cost_usd: f64) -> Self {
        let cost_micro_usd = if cost_usd.is_finite() && cost_usd > 0.0 {
            (cost_usd * MICROS_PER_USD).round() as u64
        } else {
            0
        };
        Self {
            tokens_in,
            tokens_out,
            api_calls: 1,
            cost_micro_usd,
        }
    }
}

#[derive(Debug, Default)]
struct StageCounters {
    tokens_in: AtomicU64,
    tokens_out: AtomicU64,
    api_calls: AtomicU64,
    cost_micro_usd: AtomicU64,
}

impl StageCounters {
    fn add(&self, usage: CostUsage) {
        self.tokens_in.fetch_add(usage.tokens_in, Ordering::Relaxed);
        self.tokens_out.fetch_add(usage.tokens_out, Ordering::Relaxed);
        self.api_calls.fetch_add(usage.api_calls, Ordering::Relaxed);
        self.cost_micro_usd.fetch_add(usage.cost_micro_usd, Ordering::Relaxed);
    }

    fn load(&self) -> StageCost {
        StageCost {
            tokens_in: self.tokens_in.load(Ordering::Relaxed),
            tokens_out: self.tokens_out.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            cost_usd: self.cost_micro_usd.load(Ordering::Relaxed) as f64 / MICROS_PER_USD,
        }
    }
}

/// Totals for one stage, or for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCost {
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub api_calls: u64,
    pub cost_usd: f64,
}

impl StageCost {
    fn is_zero(&self) -> bool {
        self.tokens_in == 0 && self.tokens_out == 0 && self.api_calls == 0 && self.cost_usd == 0.0
    }
}

/// Point-in-time copy of a run's costs. Stages with no usage are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSnapshot {
    pub per_stage: BTreeMap<String, StageCost>,
    pub total: StageCost,
}

/// Accumulate-only cost sink shared across a run.
#[derive(Debug, Clone, Default)]
pub struct CostTracker {
    stages: Arc<[StageCounters; STAGE_COUNT]>,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stage: StageNumber, usage: CostUsage) {
        self.stages[stage.index()].add(usage);
    }

    pub fn stage_total(&self, stage: StageNumber) -> StageCost {
        self.stages[stage.index()].load()
    }

    pub fn snapshot(&self) -> CostSnapshot {
        let mut per_stage = BTreeMap::new();
        let mut micro_total = 0u64;
        let mut total = StageCost::default();

        for stage in StageNumber::all() {
            let counters = &self.stages[stage.index()];
            let cost = counters.load();
            if cost.is_zero() {
                continue;
            }
            total.tokens_in += cost.tokens_in;
            total.tokens_out += cost.tokens_out;
            total.api_calls += cost.api_calls;
            micro_total += counters.cost_micro_usd.load(Ordering::Relaxed);
            per_stage.insert(stage.id(), cost);
        }
        total.cost_usd = micro_total as f64 / MICROS_PER_USD;

        CostSnapshot { per_stage, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(n: i64) -> StageNumber {
        StageNumber::new(n).unwrap()
    }

    #[test]
    fn test_usage_from_dollars() {
        let usage = CostUsage::api_call(120, 30, 0.0025);
        assert_eq!(usage.cost_micro_usd, 2500);
        assert_eq!(usage.api_calls, 1);
        assert_eq!(CostUsage::api_call(1, 1, f64::NAN).cost_micro_usd, 0);
    }

    #[test]
    fn test_records_are_attributed_per_stage() {
        let tracker = CostTracker::new();
        tracker.record(stage(0), CostUsage::api_call(100, 50, 0.01));
        tracker.record(stage(3), CostUsage::api_call(10, 5, 0.002));
        tracker.record(stage(3), CostUsage::api_call(10, 5, 0.002));

        let snapshot = tracker.snapshot();

        assert_eq!(snapshot.per_stage.len(), 2);
        assert_eq!(snapshot.per_stage["03_workers"].api_calls, 2);
        assert_eq!(snapshot.per_stage["03_workers"].tokens_in, 20);
        assert_eq!(snapshot.total.api_calls, 3);
        assert_eq!(snapshot.total.tokens_out, 60);
        assert!((snapshot.total.cost_usd - 0.014).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let tracker = CostTracker::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    tracker.record(stage(3), CostUsage::api_call(1, 2, 0.000001));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let total = tracker.stage_total(stage(3));
        assert_eq!(total.api_calls, 1600);
        assert_eq!(total.tokens_in, 1600);
        assert_eq!(total.tokens_out, 3200);
    }
}
