// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::read_candidates;
use crate::candidates::deduplicate;
use crate::config::stage_map::StageNumber;
use crate::engine::StageContext;
use crate::observability::messages::stage::{DedupCompleted, UpstreamInputMissing};
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageOutput, StageTimer, UpstreamOutput};

const NUMBER: StageNumber = StageNumber::DEDUPE;
const STAGE: &str = "05_dedupe";

/// Stage 5: cluster near-duplicate candidates and keep one per cluster.
pub struct DedupeStage;

impl DedupeStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DedupeStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for DedupeStage {
    fn number(&self) -> StageNumber {
        NUMBER
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        let timer = StageTimer::start();

        let candidates = match upstream {
            Some(u) => read_candidates(STAGE, &u.data)?,
            None => {
                UpstreamInputMissing { stage_id: STAGE }.log();
                Vec::new()
            }
        };

        let result = deduplicate(&candidates, ctx.config.dedup.similarity_threshold);

        DedupCompleted {
            stage_id: STAGE,
            original_count: result.stats.original_count,
            deduped_count: result.stats.deduped_count,
            cluster_count: result.stats.cluster_count,
        }
        .log();

        let data: Value = serde_json::to_value(&result)?;
        Ok(StageOutput::new(NUMBER, ctx, upstream, data, timer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{Candidate, CandidateType, Origin};
    use crate::config::RunConfig;
    use serde_json::json;

    fn candidate(id: &str, title: &str, score: f64) -> Candidate {
        Candidate::new(id, CandidateType::Place, title, Origin::Web)
            .with_location("Asakusa, Tokyo")
            .with_score(score)
    }

    #[tokio::test]
    async fn test_dedupes_normalized_candidates() {
        let ctx = StageContext::new("s", "r", RunConfig::default());
        let input = UpstreamOutput {
            stage_id: "04_normalize".to_string(),
            data: json!({
                "candidates": [
                    candidate("web-1", "Senso-ji Temple", 60.0),
                    candidate("web-2", "SENSO-JI temple!", 80.0),
                    candidate("web-3", "Kappabashi Street", 55.0),
                ],
                "stats": {}
            }),
        };

        let output = DedupeStage::new().execute(&ctx, Some(&input)).await.unwrap();

        let stats = &output.data["stats"];
        assert_eq!(stats["originalCount"], 3);
        assert_eq!(stats["dedupedCount"], 2);
        assert_eq!(stats["duplicatesRemoved"], 1);
        assert_eq!(output.data["dedupedCandidates"][0]["candidateId"], "web-2");
    }

    #[tokio::test]
    async fn test_threshold_comes_from_config() {
        let mut config = RunConfig::default();
        config.dedup.similarity_threshold = 1.0;
        let ctx = StageContext::new("s", "r", config);
        let input = UpstreamOutput {
            stage_id: "04_normalize".to_string(),
            data: json!({"candidates": [
                candidate("web-1", "Tokyo Tower observation deck", 60.0),
                candidate("web-2", "Tokyo Tower deck", 70.0),
            ]}),
        };

        let output = DedupeStage::new().execute(&ctx, Some(&input)).await.unwrap();
        assert_eq!(output.data["stats"]["clusterCount"], 2);
    }

    #[tokio::test]
    async fn test_empty_and_missing_input() {
        let ctx = StageContext::new("s", "r", RunConfig::default());
        let empty = UpstreamOutput {
            stage_id: "04_normalize".to_string(),
            data: json!({"candidates": []}),
        };

        for upstream in [None, Some(&empty)] {
            let output = DedupeStage::new().execute(&ctx, upstream).await.unwrap();
            assert_eq!(output.data["dedupedCandidates"], json!([]));
            assert_eq!(output.data["clusters"], json!([]));
            assert_eq!(output.data["stats"]["originalCount"], 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_upstream_fails() {
        let ctx = StageContext::new("s", "r", RunConfig::default());
        let input = UpstreamOutput {
            stage_id: "04_normalize".to_string(),
            data: json!({"unexpected": true}),
        };

        let error = DedupeStage::new().execute(&ctx, Some(&input)).await.unwrap_err();
        assert!(error.to_string().contains("05_dedupe"));
    }
}
