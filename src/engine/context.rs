// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::cost::{CostTracker, CostUsage};
use crate::config::stage_map::StageNumber;
use crate::config::RunConfig;

/// Per-run execution environment handed to every stage.
///
/// The executor clones the run context once per stage with
/// [`StageContext::for_stage`], which binds the cost sink to that stage.
/// Stages read from the context and may only write to it through
/// [`StageContext::record_cost`].
#[derive(Debug, Clone)]
pub struct StageContext {
    pub session_id: String,
    pub run_id: String,
    pub config: Arc<RunConfig>,
    /// The original travel request, forwarded by the first stage.
    pub request: Option<Value>,
    costs: CostTracker,
    stage: Option<StageNumber>,
}

impl StageContext {
    pub fn new(session_id: impl Into<String>, run_id: impl Into<String>, config: RunConfig) -> Self {
        Self {
            session_id: session_id.into(),
            run_id: run_id.into(),
            config: Arc::new(config),
            request: None,
            costs: CostTracker::new(),
            stage: None,
        }
    }

    pub fn with_request(mut self, request: Value) -> Self {
        self.request = Some(request);
        self
    }

    /// A fresh, sortable run id: UTC timestamp plus a short random suffix.
    pub fn generate_run_id() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"), &suffix[..8])
    }

    pub fn data_root(&self) -> &Path {
        &self.config.data_root
    }

    /// A copy of this context whose cost sink writes to `stage`.
    pub fn for_stage(&self, stage: StageNumber) -> StageContext {
        let mut bound = self.clone();
        bound.stage = Some(stage);
        bound
    }

    pub fn stage(&self) -> Option<StageNumber> {
        self.stage
    }

    /// Add usage to the bound stage's counters.
    ///
    /// A context not bound to a stage has nowhere to attribute cost, so the
    /// usage is dropped.
    pub fn record_cost(&self, usage: CostUsage) {
        if let Some(stage) = self.stage {
            self.costs.record(stage, usage);
        }
    }

    pub fn costs(&self) -> &CostTracker {
        &self.costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_contexts_share_one_tracker() {
        let ctx = StageContext::new("s1", "r1", RunConfig::default());
        let stage0 = ctx.for_stage(StageNumber::new(0).unwrap());
        let stage9 = ctx.for_stage(StageNumber::new(9).unwrap());

        stage0.record_cost(CostUsage::api_call(10, 20, 0.001));
        stage9.record_cost(CostUsage::api_call(5, 5, 0.002));
        // Unbound context is a no-op
        ctx.record_cost(CostUsage::api_call(1000, 1000, 1.0));

        let snapshot = ctx.costs().snapshot();
        assert_eq!(snapshot.per_stage.len(), 2);
        assert_eq!(snapshot.total.api_calls, 2);
        assert_eq!(snapshot.per_stage["09_aggregate"].tokens_in, 5);
    }

    #[test]
    fn test_generated_run_ids_are_unique() {
        let a = StageContext::generate_run_id();
        let b = StageContext::generate_run_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), "20250101T000000Z-".len() + 8);
    }
}
