// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Candidate data model shared by every candidate-producing stage.
//!
//! Field names serialize in camelCase so that checkpoint payloads keep the
//! exact shape downstream collaborators (aggregation, export) read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::text::destination_from_location;
use crate::errors::CandidateError;

/// Lowest and highest allowed candidate scores.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Kind of recommendable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateType {
    Place,
    Food,
    Activity,
    Neighborhood,
    Daytrip,
    Experience,
}

impl CandidateType {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateType::Place => "place",
            CandidateType::Food => "food",
            CandidateType::Activity => "activity",
            CandidateType::Neighborhood => "neighborhood",
            CandidateType::Daytrip => "daytrip",
            CandidateType::Experience => "experience",
        }
    }

    /// Lenient parse used on raw worker output; unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "place" | "attraction" | "sight" | "landmark" => Some(CandidateType::Place),
            "food" | "restaurant" | "cafe" | "bar" => Some(CandidateType::Food),
            "activity" => Some(CandidateType::Activity),
            "neighborhood" | "neighbourhood" | "district" => Some(CandidateType::Neighborhood),
            "daytrip" | "excursion" => Some(CandidateType::Daytrip),
            "experience" | "event" | "tour" => Some(CandidateType::Experience),
            _ => None,
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which search worker produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Web,
    Places,
    Youtube,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Web => "web",
            Origin::Places => "places",
            Origin::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a candidate has been corroborated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    NeedsVerification,
    Provisional,
    Verified,
    High,
}

impl Confidence {
    /// Ordering used for tie-breaks: high > verified > provisional > needs_verification.
    pub fn rank(self) -> u8 {
        match self {
            Confidence::NeedsVerification => 0,
            Confidence::Provisional => 1,
            Confidence::Verified => 2,
            Confidence::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Provenance of a candidate: where the information came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub url: String,
    pub publisher: String,
    pub retrieved_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SourceRef {
    pub fn new(url: impl Into<String>, publisher: impl Into<String>, retrieved_at: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            publisher: publisher.into(),
            retrieved_at: retrieved_at.into(),
            snippet: None,
        }
    }
}

/// A single recommendable item flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub candidate_id: String,
    #[serde(rename = "type")]
    pub candidate_type: CandidateType,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub origin: Origin,
    #[serde(default)]
    pub source_refs: Vec<SourceRef>,
    pub confidence: Confidence,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Candidate {
    /// A bare candidate with neutral defaults; callers fill in the rest.
    pub fn new(
        candidate_id: impl Into<String>,
        candidate_type: CandidateType,
        title: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            candidate_type,
            title: title.into(),
            summary: String::new(),
            location_text: None,
            coordinates: None,
            tags: Vec::new(),
            origin,
            source_refs: Vec::new(),
            confidence: Confidence::NeedsVerification,
            score: 50.0,
            cluster_id: None,
            metadata: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_text = Some(location.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = clamp_score(score);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source_refs.push(source);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// Destination the candidate belongs to, used for diversity caps.
    ///
    /// An explicit `metadata.destination` wins; normalization stamps one on
    /// every candidate that has a location. Otherwise the destination is read
    /// from `locationText` by [`destination_from_location`], so "Chuo City,
    /// Tokyo, Japan" and "Asakusa, Tokyo" are both `tokyo`. Returns `None`
    /// when neither is present.
    pub fn destination(&self) -> Option<String> {
        let from_metadata = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("destination"))
            .and_then(Value::as_str)
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty());

        from_metadata.or_else(|| {
            self.location_text
                .as_deref()
                .and_then(destination_from_location)
        })
    }

    /// Check the model invariants that must hold for every stage output.
    pub fn validate(&self) -> Result<(), CandidateError> {
        if !self.score.is_finite() || self.score < MIN_SCORE || self.score > MAX_SCORE {
            return Err(CandidateError::InvalidCandidate {
                candidate_id: self.candidate_id.clone(),
                reason: format!("score {} is outside [0, 100]", self.score),
            });
        }
        if self.source_refs.is_empty() && self.confidence != Confidence::NeedsVerification {
            return Err(CandidateError::InvalidCandidate {
                candidate_id: self.candidate_id.clone(),
                reason: format!(
                    "confidence {:?} requires at least one source reference",
                    self.confidence
                ),
            });
        }
        Ok(())
    }
}

/// Clamp a raw score into `[0, 100]`; non-finite values become 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(MIN_SCORE, MAX_SCORE)
    } else {
        MIN_SCORE
    }
}
