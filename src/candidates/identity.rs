// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic, content-derived candidate identifiers.
//!
//! An id is `<origin>-<hash8>` where `hash8` is the first eight hex characters
//! of the SHA-256 of the normalized `title|location` seed. Casing, punctuation
//! and surrounding whitespace never influence the id; the origin only sets the
//! prefix.
//!
//! Eight hex characters is a 32-bit space, so collisions are possible in a
//! large run. Uniqueness is therefore enforced explicitly by
//! [`ensure_unique_ids`] rather than assumed.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::model::{Candidate, Origin};
use super::text::identity_seed;

const HASH_PREFIX_LEN: usize = 8;

/// Generate the content-derived id for a candidate.
///
/// ```
/// use the_waypoint::candidates::{generate_candidate_id, Origin};
///
/// let a = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Web);
/// let b = generate_candidate_id("  tsukiji MARKET  ", Some("  tokyo  "), Origin::Web);
/// assert_eq!(a, b);
/// assert!(a.starts_with("web-"));
/// assert_eq!(a.len(), "web-".len() + 8);
/// ```
pub fn generate_candidate_id(title: &str, location: Option<&str>, origin: Origin) -> String {
    let seed = identity_seed(title, location);
    let digest = Sha256::digest(seed.as_bytes());
    let hex = format!("{:x}", digest);
    format!("{}-{}", origin.as_str(), &hex[..HASH_PREFIX_LEN])
}

/// Resolve duplicate ids in a single left-to-right pass.
///
/// The first occurrence keeps its id; later ones get `-1`, `-2`, ... appended
/// until the id is unused. Order and all other fields are untouched. Returns
/// the number of ids that had to be rewritten.
pub fn ensure_unique_ids(candidates: &mut [Candidate]) -> usize {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut rewritten = 0;

    for candidate in candidates.iter_mut() {
        if seen.insert(candidate.candidate_id.clone()) {
            continue;
        }

        let base = candidate.candidate_id.clone();
        let mut suffix = 1usize;
        let unique = loop {
            let attempt = format!("{}-{}", base, suffix);
            if !seen.contains(&attempt) {
                break attempt;
            }
            suffix += 1;
        };

        seen.insert(unique.clone());
        candidate.candidate_id = unique;
        rewritten += 1;
    }

    rewritten
}

/// Assign content-derived ids to freshly normalized candidates, then make them unique.
///
/// This is the standard onboarding path for candidates entering the pipeline.
/// Returns the number of collisions resolved.
pub fn generate_candidate_ids(candidates: &mut [Candidate]) -> usize {
    for candidate in candidates.iter_mut() {
        candidate.candidate_id = generate_candidate_id(
            &candidate.title,
            candidate.location_text.as_deref(),
            candidate.origin,
        );
    }
    ensure_unique_ids(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::model::CandidateType;

    fn candidate(id: &str, title: &str) -> Candidate {
        Candidate::new(id, CandidateType::Place, title, Origin::Web)
    }

    #[test]
    fn test_id_is_case_and_whitespace_insensitive() {
        let a = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Web);
        let b = generate_candidate_id("  tsukiji MARKET  ", Some("  tokyo  "), Origin::Web);
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_ignores_punctuation() {
        let a = generate_candidate_id("Senso-ji Temple!", Some("Asakusa, Tokyo"), Origin::Web);
        let b = generate_candidate_id("sensoji temple", Some("asakusa tokyo"), Origin::Web);
        assert_eq!(a, b);
    }

    #[test]
    fn test_origin_changes_prefix_only() {
        let web = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Web);
        let places = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Places);
        let youtube = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Youtube);

        assert!(web.starts_with("web-"));
        assert!(places.starts_with("places-"));
        assert!(youtube.starts_with("youtube-"));

        let suffix = |id: &str| id.rsplit('-').next().unwrap().to_string();
        assert_eq!(suffix(&web), suffix(&places));
        assert_eq!(suffix(&web), suffix(&youtube));
    }

    #[test]
    fn test_id_matches_direct_sha256_prefix() {
        let id = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Web);
        let expected = format!("{:x}", Sha256::digest(b"tsukiji market|tokyo"));
        assert_eq!(id, format!("web-{}", &expected[..8]));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_candidate_id("Tsukiji Market", Some("Tokyo"), Origin::Web);
        let b = generate_candidate_id("Nishiki Market", Some("Kyoto"), Origin::Web);
        let c = generate_candidate_id("Tsukiji Market", None, Origin::Web);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_non_latin_titles_get_distinct_ids() {
        let tsukiji = generate_candidate_id("築地市場", Some("Tokyo"), Origin::Web);
        let sensoji = generate_candidate_id("浅草寺", Some("Tokyo"), Origin::Web);
        let blank = generate_candidate_id("", Some("Tokyo"), Origin::Web);
        assert_ne!(tsukiji, sensoji);
        assert_ne!(tsukiji, blank);
    }

    #[test]
    fn test_ensure_unique_ids_appends_suffixes_in_order() {
        let mut candidates = vec![candidate("x", "A"), candidate("x", "B"), candidate("y", "C")];

        let rewritten = ensure_unique_ids(&mut candidates);

        let ids: Vec<&str> = candidates.iter().map(|c| c.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "x-1", "y"]);
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(rewritten, 1);
    }

    #[test]
    fn test_ensure_unique_ids_skips_taken_suffixes() {
        let mut candidates = vec![
            candidate("x", "A"),
            candidate("x-1", "B"),
            candidate("x", "C"),
            candidate("x", "D"),
        ];

        ensure_unique_ids(&mut candidates);

        let ids: Vec<&str> = candidates.iter().map(|c| c.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "x-1", "x-2", "x-3"]);
    }

    #[test]
    fn test_ensure_unique_ids_leaves_other_fields_alone() {
        let original = vec![
            candidate("x", "A").with_score(90.0).with_location("Tokyo"),
            candidate("x", "B").with_score(10.0).with_tags(["market"]),
        ];
        let mut candidates = original.clone();

        ensure_unique_ids(&mut candidates);

        for (before, after) in original.iter().zip(&candidates) {
            let mut after = after.clone();
            after.candidate_id = before.candidate_id.clone();
            assert_eq!(&after, before);
        }
    }

    #[test]
    fn test_generate_candidate_ids_resolves_collisions() {
        let mut candidates = vec![
            candidate("", "Tsukiji Market").with_location("Tokyo"),
            candidate("", "TSUKIJI market").with_location("tokyo"),
            candidate("", "Golden Gai").with_location("Tokyo"),
        ];

        let collisions = generate_candidate_ids(&mut candidates);

        assert_eq!(collisions, 1);
        assert_eq!(candidates[1].candidate_id, format!("{}-1", candidates[0].candidate_id));
        assert_ne!(candidates[2].candidate_id, candidates[0].candidate_id);
    }

    #[test]
    fn test_empty_input() {
        let mut candidates: Vec<Candidate> = Vec::new();
        assert_eq!(generate_candidate_ids(&mut candidates), 0);
    }
}
