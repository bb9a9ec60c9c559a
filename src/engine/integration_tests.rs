use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use crate::backends::local::LocalStageFactory;
use crate::backends::stub::{FailingStage, RecordingObserver, StubStage};
use crate::checkpoint::CheckpointStore;
use crate::config::stage_map::StageNumber;
use crate::config::{RunConfig, RuntimeBuilder};
use crate::engine::{ExecutorOptions, PipelineExecutor, StageContext, StageStatus};
use crate::errors::ExecutionError;

/// Integration tests for the pipeline executor, checkpoint store and built-in stages
#[cfg(test)]
mod tests {
    use super::*;

    fn stage(n: i64) -> StageNumber {
        StageNumber::new(n).unwrap()
    }

    fn context(dir: &TempDir, run_id: &str) -> StageContext {
        let mut config = RunConfig::default();
        config.data_root = dir.path().to_path_buf();
        StageContext::new("session", run_id, config)
    }

    /// Stages 0..=2 with stage 1 failing.
    fn three_stage_executor(dir: &TempDir) -> PipelineExecutor {
        let mut executor = PipelineExecutor::new(CheckpointStore::new(dir.path()));
        executor.register_stage(Arc::new(StubStage::new(stage(0)))).unwrap();
        executor
            .register_stage(Arc::new(FailingStage::new(stage(1), "intake service unavailable")))
            .unwrap();
        executor.register_stage(Arc::new(StubStage::new(stage(2)))).unwrap();
        executor
    }

    fn worker_request() -> Value {
        json!({
            "results": [
                {"worker": "perplexity", "candidates": [
                    {"title": "Fushimi Inari Taisha", "location": "Fushimi, Kyoto", "score": 92,
                     "sources": ["https://www.example.com/inari"]},
                    {"title": "Nishiki Market", "location": "Nakagyo, Kyoto", "type": "food", "score": 85,
                     "sources": ["https://www.example.com/nishiki"]},
                    {"title": "Arashiyama Bamboo Grove", "location": "Arashiyama, Kyoto", "score": 80}
                ]},
                {"worker": "places", "candidates": [
                    {"name": "Nishiki Market", "address": "Nakagyo, Kyoto", "types": ["food"],
                     "placeId": "ChIJ-nishiki", "rating": 4.4, "score": 78},
                    {"name": "Kiyomizu-dera", "address": "Higashiyama, Kyoto", "placeId": "ChIJ-kiyomizu", "score": 88}
                ]},
                {"worker": "youtube", "candidates": [
                    {"title": "Fushimi Inari Taisha", "location": "Fushimi, Kyoto", "videoId": "abc123",
                     "channelTitle": "Kyoto Walks", "score": 70}
                ]}
            ]
        })
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let executor = three_stage_executor(&dir);
        let options = ExecutorOptions {
            stop_after_stage: Some(stage(2)),
            ..ExecutorOptions::default()
        };

        let result = executor.execute(&context(&dir, "run-1"), &options).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.stages_executed, vec!["00_enhancement"]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage_id, "01_intake");
        assert_eq!(result.errors[0].error, "intake service unavailable");
        assert!(!result.errors[0].continued);
        assert_eq!(result.stage_status["01_intake"], StageStatus::Failed);
        assert_eq!(result.stage_status["02_router"], StageStatus::Pending);

        let manifest = executor
            .store()
            .load_manifest("session", "run-1")
            .await
            .unwrap()
            .expect("failed runs still write a manifest");
        assert!(!manifest.success);
        assert_eq!(manifest.stages.len(), 1);
    }

    #[tokio::test]
    async fn test_continue_on_error_degrades_and_keeps_going() {
        let dir = TempDir::new().unwrap();
        let executor = three_stage_executor(&dir);
        let options = ExecutorOptions {
            stop_after_stage: Some(stage(2)),
            continue_on_error: true,
            ..ExecutorOptions::default()
        };

        let result = executor.execute(&context(&dir, "run-1"), &options).await.unwrap();

        assert!(result.success);
        assert_eq!(result.stages_executed.len(), 3);
        assert_eq!(result.degraded_stages, vec!["01_intake"]);

        let manifest = executor
            .store()
            .load_manifest("session", "run-1")
            .await
            .unwrap()
            .unwrap();
        let entries: Vec<(&str, Option<&str>)> = manifest
            .stages
            .iter()
            .map(|e| (e.stage_id.as_str(), e.upstream_stage.as_deref()))
            .collect();
        assert_eq!(
            entries,
            vec![("00_enhancement", None), ("02_router", Some("00_enhancement"))]
        );
        assert_eq!(manifest.stages_executed, result.stages_executed);
        assert_eq!(
            manifest.stages_executed,
            vec!["00_enhancement", "01_intake", "02_router"]
        );
        assert_eq!(manifest.final_stage.as_deref(), Some("02_router"));
    }

    #[tokio::test]
    async fn test_degraded_final_stage_is_the_manifest_final_stage() {
        let dir = TempDir::new().unwrap();
        let mut executor = PipelineExecutor::new(CheckpointStore::new(dir.path()));
        executor.register_stage(Arc::new(StubStage::new(stage(0)))).unwrap();
        executor.register_stage(Arc::new(StubStage::new(stage(1)))).unwrap();
        executor
            .register_stage(Arc::new(FailingStage::new(stage(2), "router timed out")))
            .unwrap();
        let options = ExecutorOptions {
            stop_after_stage: Some(stage(2)),
            continue_on_error: true,
            ..ExecutorOptions::default()
        };

        let result = executor.execute(&context(&dir, "run-1"), &options).await.unwrap();

        let manifest = executor
            .store()
            .load_manifest("session", "run-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manifest.stages.len(), 2);
        assert_eq!(manifest.stages_executed, result.stages_executed);
        assert_eq!(manifest.final_stage.as_deref(), Some("02_router"));
    }

    #[tokio::test]
    async fn test_resume_from_top_candidates_uses_only_stage_seven() {
        let dir = TempDir::new().unwrap();
        let (executor, options) = {
            let mut config = RunConfig::default();
            config.data_root = dir.path().to_path_buf();
            RuntimeBuilder::from_config(&config).unwrap()
        };

        let seed = json!({
            "dedupedCandidates": [
                {"candidateId": "web-aaaa0001", "type": "place", "title": "Kinkaku-ji",
                 "locationText": "Kita, Kyoto", "origin": "web", "confidence": "needs_verification", "score": 75},
                {"candidateId": "web-aaaa0002", "type": "food", "title": "Pontocho Alley",
                 "locationText": "Nakagyo, Kyoto", "origin": "web", "confidence": "needs_verification", "score": 90}
            ]
        });
        executor
            .store()
            .write_checkpoint("session", "source-run", stage(7), &seed)
            .await
            .unwrap();

        let ctx = context(&dir, "resumed-run");
        let result = executor
            .execute_from_stage(&ctx, 8, "source-run", &options)
            .await
            .unwrap();

        let expected_skipped: Vec<String> = (0..8).map(|n| stage(n).id()).collect();
        assert!(result.success);
        assert_eq!(result.stages_skipped, expected_skipped);
        assert_eq!(
            result.stages_executed,
            vec!["08_top_candidates", "09_aggregate", "10_results"]
        );
        assert!(expected_skipped
            .iter()
            .all(|id| result.stage_status[id] == StageStatus::Skipped));

        let output = result.output.unwrap();
        assert_eq!(output["candidates"][0]["title"], "Pontocho Alley");
        assert_eq!(output["stats"]["inputCount"], 2);

        let manifest = executor
            .store()
            .load_manifest("session", "resumed-run")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manifest.stages_skipped, expected_skipped);
        assert_eq!(manifest.stages[0].upstream_stage.as_deref(), Some("07_validate"));
        assert!(!executor
            .store()
            .checkpoint_exists("session", "resumed-run", "07_validate")
            .await);
    }

    #[tokio::test]
    async fn test_resume_without_source_checkpoint_is_fatal() {
        let dir = TempDir::new().unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let mut executor =
            PipelineExecutor::new(CheckpointStore::new(dir.path())).with_observer(observer.clone());
        for stage in LocalStageFactory::create_all() {
            executor.register_stage(stage).unwrap();
        }

        let error = executor
            .execute_from_stage(&context(&dir, "run-2"), 8, "run-1", &ExecutorOptions::default())
            .await
            .unwrap_err();

        match error {
            ExecutionError::ResumeCheckpointMissing { stage_id, source_run_id, .. } => {
                assert_eq!(stage_id, "07_validate");
                assert_eq!(source_run_id, "run-1");
            }
            other => panic!("unexpected error: {}", other),
        }
        let expected: Vec<String> = (0..8).map(|n| format!("skip:{}", stage(n).id())).collect();
        assert_eq!(observer.events(), expected);
    }

    #[tokio::test]
    async fn test_resume_reports_skips_to_observer() {
        let dir = TempDir::new().unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let mut executor =
            PipelineExecutor::new(CheckpointStore::new(dir.path())).with_observer(observer.clone());
        for n in StageNumber::all() {
            executor.register_stage(Arc::new(StubStage::new(n))).unwrap();
        }
        executor
            .store()
            .write_checkpoint("session", "run-1", stage(8), &json!({"stage": "08_top_candidates"}))
            .await
            .unwrap();

        let result = executor
            .execute_from_stage(&context(&dir, "run-2"), 9, "run-1", &ExecutorOptions::default())
            .await
            .unwrap();

        let events = observer.events();
        assert_eq!(events.iter().filter(|e| e.starts_with("skip:")).count(), 9);
        assert_eq!(events[9], "start:09_aggregate");
        assert_eq!(result.output.unwrap()["input"], "09_aggregate");
    }

    #[tokio::test]
    async fn test_full_pipeline_with_built_in_stages() {
        let dir = TempDir::new().unwrap();
        let mut config = RunConfig::default();
        config.data_root = dir.path().to_path_buf();
        let (executor, options) = RuntimeBuilder::from_config(&config).unwrap();
        let ctx = StageContext::new("kyoto", "run-1", config).with_request(worker_request());

        let result = executor.execute(&ctx, &options).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stages_executed.len(), 11);

        let normalized = executor
            .store()
            .read_checkpoint("kyoto", "run-1", "04_normalize")
            .await
            .unwrap();
        assert_eq!(normalized.data["stats"]["outputCount"], 6);
        assert_eq!(normalized.meta.stage_number, 4);

        let deduped = executor
            .store()
            .read_checkpoint("kyoto", "run-1", "05_dedupe")
            .await
            .unwrap();
        let stats = &deduped.data["stats"];
        assert_eq!(stats["originalCount"], 6);
        assert_eq!(stats["dedupedCount"], 4);
        assert_eq!(stats["duplicatesRemoved"], 2);

        let output = result.output.unwrap();
        let top = output["candidates"].as_array().unwrap();
        assert_eq!(top.len(), 4);
        assert_eq!(top[0]["title"], "Fushimi Inari Taisha");
        assert_eq!(top[0]["sourceRefs"].as_array().unwrap().len(), 2);

        let report = executor.store().verify_manifest("kyoto", "run-1").await.unwrap();
        assert!(report.valid);
        assert_eq!(report.stages.len(), 11);
    }

    #[tokio::test]
    async fn test_dry_run_executes_without_persisting() {
        let dir = TempDir::new().unwrap();
        let mut config = RunConfig::default();
        config.data_root = dir.path().to_path_buf();
        config.dry_run = true;
        let (executor, options) = RuntimeBuilder::from_config(&config).unwrap();
        let ctx = StageContext::new("kyoto", "run-1", config).with_request(worker_request());

        let result = executor.execute(&ctx, &options).await.unwrap();

        assert!(result.success);
        assert!(result.output.unwrap()["candidates"].is_array());
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_worker_output_degrades_normalize() {
        let dir = TempDir::new().unwrap();
        let mut config = RunConfig::default();
        config.data_root = dir.path().to_path_buf();
        config.failure_strategy = crate::errors::FailureStrategy::ContinueOnError;
        let (executor, options) = RuntimeBuilder::from_config(&config).unwrap();
        let ctx = StageContext::new("kyoto", "run-1", config).with_request(json!({"results": 42}));

        let result = executor.execute(&ctx, &options).await.unwrap();

        // Stage 5 sees stage 3's payload, which has no candidate list either.
        assert_eq!(result.degraded_stages, vec!["04_normalize", "05_dedupe", "08_top_candidates"]);
        assert!(result.errors.iter().all(|e| e.continued));
        assert!(result.success);
    }
}
