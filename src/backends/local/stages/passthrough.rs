// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::stage_map::StageNumber;
use crate::engine::StageContext;
use crate::traits::{Stage, StageOutput, StageTimer, UpstreamOutput};

/// Placeholder for stages whose real work happens in an external collaborator.
///
/// Forwards the upstream data unchanged. With no upstream (stage 0, or every
/// earlier stage degraded) it forwards the run's request payload, or `{}`.
pub struct PassthroughStage {
    number: StageNumber,
}

impl PassthroughStage {
    pub fn new(number: StageNumber) -> Self {
        Self { number }
    }
}

#[async_trait]
impl Stage for PassthroughStage {
    fn number(&self) -> StageNumber {
        self.number
    }

    async fn execute(
        &self,
        ctx: &StageContext,
        upstream: Option<&UpstreamOutput>,
    ) -> anyhow::Result<StageOutput> {
        let timer = StageTimer::start();
        let data: Value = match (upstream, &ctx.request) {
            (Some(upstream), _) => upstream.data.clone(),
            (None, Some(request)) => request.clone(),
            (None, None) => json!({}),
        };
        Ok(StageOutput::new(self.number, ctx, upstream, data, timer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    fn stage(n: i64) -> StageNumber {
        StageNumber::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_forwards_upstream_over_request() {
        let ctx = StageContext::new("s", "r", RunConfig::default()).with_request(json!({"q": "tokyo"}));
        let upstream = UpstreamOutput {
            stage_id: "05_dedupe".to_string(),
            data: json!({"dedupedCandidates": []}),
        };

        let output = PassthroughStage::new(stage(6))
            .execute(&ctx, Some(&upstream))
            .await
            .unwrap();

        assert_eq!(output.data, upstream.data);
        assert_eq!(output.metadata.upstream_stage.as_deref(), Some("05_dedupe"));
        assert_eq!(output.metadata.stage_name, "rank");
    }

    #[tokio::test]
    async fn test_without_upstream() {
        let passthrough = PassthroughStage::new(stage(0));

        let bare = StageContext::new("s", "r", RunConfig::default());
        assert_eq!(passthrough.execute(&bare, None).await.unwrap().data, json!({}));

        let with_request = bare.with_request(json!({"q": "kyoto"}));
        let output = passthrough.execute(&with_request, None).await.unwrap();
        assert_eq!(output.data, json!({"q": "kyoto"}));
        assert_eq!(output.metadata.upstream_stage, None);
    }
}
