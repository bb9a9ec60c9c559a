// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod dedupe;
pub mod normalize;
pub mod passthrough;
pub mod top_candidates;

pub use dedupe::DedupeStage;
pub use normalize::NormalizeStage;
pub use passthrough::PassthroughStage;
pub use top_candidates::TopCandidatesStage;

use serde_json::Value;

use crate::candidates::Candidate;
use crate::errors::CandidateError;

/// Keys a candidate list may live under in an upstream payload, in lookup order.
const CANDIDATE_KEYS: [&str; 2] = ["candidates", "dedupedCandidates"];

/// Read and validate the candidate list carried by an upstream payload.
///
/// A payload with none of the known keys is malformed. Every candidate must
/// satisfy the model invariants before a stage is allowed to touch it.
pub(crate) fn read_candidates(stage: &'static str, data: &Value) -> Result<Vec<Candidate>, CandidateError> {
    let list = CANDIDATE_KEYS
        .iter()
        .find_map(|key| data.get(*key))
        .ok_or_else(|| CandidateError::MalformedInput {
            stage,
            reason: format!("expected one of {:?} in upstream data", CANDIDATE_KEYS),
        })?;

    let candidates: Vec<Candidate> = serde_json::from_value(list.clone())?;
    for candidate in &candidates {
        candidate.validate()?;
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_candidates_key_lookup() {
        struct TestCase {
            name: &'static str,
            data: Value,
            expected: Option<usize>,
        }

        let candidate = json!({
            "candidateId": "web-00000001",
            "type": "place",
            "title": "Senso-ji",
            "origin": "web",
            "confidence": "needs_verification",
            "score": 70.0
        });

        let test_cases = vec![
            TestCase {
                name: "candidates key",
                data: json!({"candidates": [candidate.clone()]}),
                expected: Some(1),
            },
            TestCase {
                name: "dedupedCandidates key",
                data: json!({"dedupedCandidates": [candidate.clone(), candidate.clone()]}),
                expected: Some(2),
            },
            TestCase {
                name: "empty list",
                data: json!({"candidates": []}),
                expected: Some(0),
            },
            TestCase {
                name: "no known key",
                data: json!({"items": []}),
                expected: None,
            },
        ];

        for case in test_cases {
            let result = read_candidates("05_dedupe", &case.data);
            match case.expected {
                Some(count) => assert_eq!(result.unwrap().len(), count, "{}", case.name),
                None => assert!(result.is_err(), "{}", case.name),
            }
        }
    }

    #[test]
    fn test_read_candidates_rejects_invalid_candidate() {
        let data = json!({"candidates": [{
            "candidateId": "web-00000001",
            "type": "place",
            "title": "Senso-ji",
            "origin": "web",
            "confidence": "verified",
            "score": 70.0
        }]});

        let error = read_candidates("08_top_candidates", &data).unwrap_err();
        assert!(matches!(error, CandidateError::InvalidCandidate { .. }));
    }
}
