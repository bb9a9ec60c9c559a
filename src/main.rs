// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::env;
use the_waypoint::config::{load_and_validate_config, RuntimeBuilder};
use the_waypoint::engine::StageContext;
use the_waypoint::observability::init_tracing;

fn usage(program: &str) {
    eprintln!("Usage: {} run <config.yaml> <session_id> [request.json]", program);
    eprintln!("       {} resume <config.yaml> <session_id> <from_stage> <source_run_id>", program);
    eprintln!("       {} verify <config.yaml> <session_id> <run_id>", program);
    eprintln!("Example: {} run configs/default.yaml 20250301-kyoto request.json", program);
    eprintln!("Example: {} resume configs/default.yaml 20250301-kyoto 8 20250301T101500Z-1a2b3c4d", program);
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("the-waypoint");

    let outcome = match args.get(1).map(String::as_str) {
        Some("run") if args.len() == 4 || args.len() == 5 => {
            run(&args[2], &args[3], args.get(4).map(String::as_str)).await
        }
        Some("resume") if args.len() == 6 => resume(&args[2], &args[3], &args[4], &args[5]).await,
        Some("verify") if args.len() == 5 => verify(&args[2], &args[3], &args[4]).await,
        _ => {
            usage(program);
            std::process::exit(2);
        }
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Full run with the built-in stage set. Exit code 1 when the run failed.
async fn run(config_file: &str, session_id: &str, request_file: Option<&str>) -> anyhow::Result<i32> {
    let config = load_and_validate_config(config_file)?;
    let (executor, options) = RuntimeBuilder::from_config(&config)?;

    let mut ctx = StageContext::new(session_id, StageContext::generate_run_id(), config);
    if let Some(path) = request_file {
        ctx = ctx.with_request(read_json(path)?);
    }

    let result = executor.execute(&ctx, &options).await?;
    print_json(&result)?;
    Ok(if result.success { 0 } else { 1 })
}

/// Resume into a fresh run id from `from_stage`, seeded by `source_run_id`.
async fn resume(config_file: &str, session_id: &str, from_stage: &str, source_run_id: &str) -> anyhow::Result<i32> {
    let from_stage: i64 = from_stage
        .parse()
        .with_context(|| format!("from_stage must be an integer, got '{}'", from_stage))?;

    let config = load_and_validate_config(config_file)?;
    let (executor, options) = RuntimeBuilder::from_config(&config)?;
    let ctx = StageContext::new(session_id, StageContext::generate_run_id(), config);

    let result = executor
        .execute_from_stage(&ctx, from_stage, source_run_id, &options)
        .await?;
    print_json(&result)?;
    Ok(if result.success { 0 } else { 1 })
}

/// Re-hash every checkpoint of a run against its manifest.
async fn verify(config_file: &str, session_id: &str, run_id: &str) -> anyhow::Result<i32> {
    let config = load_and_validate_config(config_file)?;
    let (executor, _) = RuntimeBuilder::from_config(&config)?;

    let report = executor.store().verify_manifest(session_id, run_id).await?;
    print_json(&report)?;
    Ok(if report.valid { 0 } else { 1 })
}

fn read_json(path: &str) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read request file: {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Request file is not valid JSON: {}", path))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
