// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conversion of raw search-worker output into [`Candidate`]s.
//!
//! The set of workers is closed, so each one is a variant of [`WorkerOutput`]
//! with its own normalizer. A worker tag nobody recognises falls into
//! [`WorkerOutput::Unknown`], which reads the handful of field names every
//! worker tends to use.
//!
//! Items without a usable title are dropped and counted, as are items that do
//! not fit their worker's shape (those are also logged). Scores may be numbers
//! or numeric strings. Ids are assigned after all workers are normalized so
//! collisions are resolved across workers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::identity::generate_candidate_ids;
use super::model::{Candidate, CandidateType, Confidence, Coordinates, Origin, SourceRef};
use crate::errors::CandidateError;
use crate::observability::messages::stage::WorkerItemRejected;
use crate::observability::messages::StructuredLog;

const STAGE: &str = "04_normalize";
const DEFAULT_SCORE: f64 = 50.0;

/// Raw output of one worker, tagged by the worker that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutput {
    Perplexity(Vec<Value>),
    Places(Vec<Value>),
    Youtube(Vec<Value>),
    Unknown { worker: String, items: Vec<Value> },
}

impl WorkerOutput {
    pub fn from_tagged(worker: &str, items: Vec<Value>) -> Self {
        match worker.trim().to_ascii_lowercase().as_str() {
            "perplexity" | "web" => WorkerOutput::Perplexity(items),
            "places" | "google_places" => WorkerOutput::Places(items),
            "youtube" => WorkerOutput::Youtube(items),
            _ => WorkerOutput::Unknown {
                worker: worker.to_string(),
                items,
            },
        }
    }

    pub fn items(&self) -> &[Value] {
        match self {
            WorkerOutput::Perplexity(items)
            | WorkerOutput::Places(items)
            | WorkerOutput::Youtube(items)
            | WorkerOutput::Unknown { items, .. } => items,
        }
    }

    fn worker(&self) -> &str {
        match self {
            WorkerOutput::Perplexity(_) => "perplexity",
            WorkerOutput::Places(_) => "places",
            WorkerOutput::Youtube(_) => "youtube",
            WorkerOutput::Unknown { worker, .. } => worker.as_str(),
        }
    }

    fn normalize_item(&self, item: &Value, retrieved_at: &str) -> Option<Candidate> {
        let worker = self.worker();
        let mut candidate = match self {
            WorkerOutput::Perplexity(_) => normalize_perplexity(parse_item(worker, item)?, retrieved_at),
            WorkerOutput::Places(_) => normalize_places(parse_item(worker, item)?, retrieved_at),
            WorkerOutput::Youtube(_) => normalize_youtube(parse_item(worker, item)?, retrieved_at),
            WorkerOutput::Unknown { .. } => normalize_unknown(item, retrieved_at),
        }?;

        let explicit = item.get("destination").and_then(Value::as_str);
        stamp_destination(&mut candidate, explicit);
        Some(candidate)
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationStats {
    pub input_count: usize,
    pub output_count: usize,
    pub dropped_count: usize,
    pub by_origin: BTreeMap<String, usize>,
    pub collisions_resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    pub candidates: Vec<Candidate>,
    pub stats: NormalizationStats,
}

#[derive(Debug, Deserialize)]
struct RawWorkerResult {
    worker: String,
    #[serde(default)]
    candidates: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawWorkerEnvelope {
    results: Vec<RawWorkerResult>,
}

/// Parse the `{ results: [{ worker, candidates }] }` payload into tagged outputs.
pub fn parse_worker_outputs(payload: &Value) -> Result<Vec<WorkerOutput>, CandidateError> {
    let envelope: RawWorkerEnvelope =
        serde_json::from_value(payload.clone()).map_err(|e| CandidateError::MalformedInput {
            stage: STAGE,
            reason: e.to_string(),
        })?;

    Ok(envelope
        .results
        .into_iter()
        .map(|r| WorkerOutput::from_tagged(&r.worker, r.candidates))
        .collect())
}

/// Normalize every worker's items, then assign unique content-derived ids.
///
/// At most `max_per_worker` items are read from each worker result; items
/// beyond the cap are not counted as input.
pub fn normalize_worker_results(
    outputs: &[WorkerOutput],
    max_per_worker: usize,
    retrieved_at: &str,
) -> NormalizationResult {
    let mut candidates = Vec::new();
    let mut input_count = 0;

    for output in outputs {
        for item in output.items().iter().take(max_per_worker) {
            input_count += 1;
            if let Some(candidate) = output.normalize_item(item, retrieved_at) {
                candidates.push(candidate);
            }
        }
    }

    let collisions_resolved = generate_candidate_ids(&mut candidates);

    let mut by_origin: BTreeMap<String, usize> = BTreeMap::new();
    for candidate in &candidates {
        *by_origin.entry(candidate.origin.as_str().to_string()).or_default() += 1;
    }

    NormalizationResult {
        stats: NormalizationStats {
            input_count,
            output_count: candidates.len(),
            dropped_count: input_count - candidates.len(),
            by_origin,
            collisions_resolved,
        },
        candidates,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSource {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        publisher: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        snippet: Option<String>,
    },
}

impl RawSource {
    fn into_source_ref(self, retrieved_at: &str) -> SourceRef {
        match self {
            RawSource::Url(url) => {
                let publisher = publisher_from_url(&url);
                SourceRef::new(url, publisher, retrieved_at)
            }
            RawSource::Detailed {
                url,
                publisher,
                title,
                snippet,
            } => {
                let publisher = publisher.or(title).unwrap_or_else(|| publisher_from_url(&url));
                let mut source = SourceRef::new(url, publisher, retrieved_at);
                source.snippet = snippet;
                source
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerplexityItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<f64>,
}

fn normalize_perplexity(raw: PerplexityItem, retrieved_at: &str) -> Option<Candidate> {
    let title = usable_title(raw.title)?;

    let mut candidate = Candidate::new(String::new(), parse_type(raw.kind.as_deref()), title, Origin::Web)
        .with_score(raw.score.unwrap_or(DEFAULT_SCORE))
        .with_tags(raw.tags);
    candidate.summary = raw.summary.unwrap_or_default();
    candidate.location_text = non_empty(raw.location);
    candidate.source_refs = raw
        .sources
        .into_iter()
        .map(|s| s.into_source_ref(retrieved_at))
        .collect();
    candidate.confidence = if candidate.source_refs.is_empty() {
        Confidence::NeedsVerification
    } else {
        Confidence::Provisional
    };
    Some(candidate)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacesItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    location: Option<Coordinates>,
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    user_ratings_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<f64>,
}

fn normalize_places(raw: PlacesItem, retrieved_at: &str) -> Option<Candidate> {
    let title = usable_title(raw.name)?;

    let candidate_type = raw
        .types
        .iter()
        .find_map(|t| CandidateType::parse(t))
        .unwrap_or(CandidateType::Place);

    let url = raw.url.or_else(|| {
        raw.place_id
            .as_ref()
            .map(|id| format!("https://www.google.com/maps/place/?q=place_id:{}", id))
    });

    let mut candidate = Candidate::new(String::new(), candidate_type, title, Origin::Places)
        .with_score(raw.score.unwrap_or(DEFAULT_SCORE))
        .with_tags(raw.types);
    candidate.location_text = non_empty(raw.address);
    candidate.coordinates = raw.location;
    if let Some(url) = url {
        candidate.source_refs.push(SourceRef::new(url, "Google Maps", retrieved_at));
        candidate.confidence = Confidence::Verified;
    }

    let mut metadata = Map::new();
    if let Some(place_id) = raw.place_id {
        metadata.insert("placeId".to_string(), Value::from(place_id));
    }
    if let Some(rating) = raw.rating {
        metadata.insert("rating".to_string(), Value::from(rating));
    }
    if let Some(total) = raw.user_ratings_total {
        metadata.insert("userRatingsTotal".to_string(), Value::from(total));
    }
    if !metadata.is_empty() {
        candidate.metadata = Some(metadata);
    }
    Some(candidate)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YoutubeItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<f64>,
}

fn normalize_youtube(raw: YoutubeItem, retrieved_at: &str) -> Option<Candidate> {
    let title = usable_title(raw.title)?;

    let mut candidate = Candidate::new(String::new(), parse_type(raw.kind.as_deref()), title, Origin::Youtube)
        .with_score(raw.score.unwrap_or(DEFAULT_SCORE));
    candidate.summary = raw.description.unwrap_or_default();
    candidate.location_text = non_empty(raw.location);

    let mut metadata = Map::new();
    if let Some(video_id) = &raw.video_id {
        let publisher = raw.channel_title.clone().unwrap_or_else(|| "YouTube".to_string());
        candidate.source_refs.push(SourceRef::new(
            format!("https://www.youtube.com/watch?v={}", video_id),
            publisher,
            retrieved_at,
        ));
        candidate.confidence = Confidence::Provisional;
        metadata.insert("videoId".to_string(), Value::from(video_id.clone()));
    }
    if let Some(channel) = raw.channel_title {
        metadata.insert("channelTitle".to_string(), Value::from(channel));
    }
    if !metadata.is_empty() {
        candidate.metadata = Some(metadata);
    }
    Some(candidate)
}

fn normalize_unknown(item: &Value, retrieved_at: &str) -> Option<Candidate> {
    let object = item.as_object()?;

    let title = usable_title(text_field(object, &["title", "name"]))?;
    let score = object.get("score").and_then(score_from_value).unwrap_or(DEFAULT_SCORE);

    let mut candidate = Candidate::new(String::new(), parse_type(text_field(object, &["type"]).as_deref()), title, Origin::Web)
        .with_score(score);
    candidate.summary = text_field(object, &["summary", "description"]).unwrap_or_default();
    candidate.location_text = non_empty(text_field(object, &["location", "locationText", "address"]));
    if let Some(url) = non_empty(text_field(object, &["url", "link"])) {
        let publisher = publisher_from_url(&url);
        candidate.source_refs.push(SourceRef::new(url, publisher, retrieved_at));
        candidate.confidence = Confidence::Provisional;
    }
    Some(candidate)
}

/// Read an item into its worker's shape, logging why it was dropped if not.
fn parse_item<T: DeserializeOwned>(worker: &str, item: &Value) -> Option<T> {
    match serde_json::from_value(item.clone()) {
        Ok(raw) => Some(raw),
        Err(e) => {
            WorkerItemRejected {
                stage_id: STAGE,
                worker,
                reason: &e.to_string(),
            }
            .log();
            None
        }
    }
}

/// Scores arrive as numbers or numeric strings; anything else is no score.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(score_from_value))
}

fn score_from_value(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|score| score.is_finite())
}

/// Record the candidate's destination in `metadata.destination` so later
/// stages do not depend on how `locationText` is phrased.
fn stamp_destination(candidate: &mut Candidate, explicit: Option<&str>) {
    let destination = explicit
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .or_else(|| candidate.destination());
    if let Some(destination) = destination {
        candidate
            .metadata
            .get_or_insert_with(Map::new)
            .insert("destination".to_string(), Value::from(destination));
    }
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| object.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn parse_type(raw: Option<&str>) -> CandidateType {
    raw.and_then(CandidateType::parse).unwrap_or(CandidateType::Place)
}

fn usable_title(raw: Option<String>) -> Option<String> {
    non_empty(raw.map(|t| t.trim().to_string()))
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Host part of a URL without a leading `www.`, or the URL itself if it has none.
fn publisher_from_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme.split(['/', '?', '#']).next().unwrap_or(without_scheme);
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        url.to_string()
    } else {
        host.to_string()
    }
}
