// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Static stage catalogue and dependency lookups for the discovery pipeline.
//!
//! The pipeline has exactly eleven stages, numbered `0..=10`, and dependency is
//! strictly linear: stage *n* consumes the checkpoint of stage *n-1* and nothing
//! else. Because of that, every question the resume logic asks ("what must
//! already exist?", "what has to run again?") reduces to a range over stage
//! numbers, and this module answers them without any graph traversal.
//!
//! ```text
//! 00_enhancement -> 01_intake -> 02_router -> 03_workers -> 04_normalize -> 05_dedupe
//!   -> 06_rank -> 07_validate -> 08_top_candidates -> 09_aggregate -> 10_results
//! ```
//!
//! Every lookup accepts anything implementing [`IntoStageNumber`] so that raw
//! integers and floats coming from JSON or config files are validated at the
//! boundary. Non-integers, NaN, infinities and values outside `[0, 10]` are
//! rejected with [`StageError::InvalidStageNumber`].
//!
//! # Examples
//!
//! ```
//! use the_waypoint::config::stage_map;
//!
//! let skipped = stage_map::skip_set_for_resume(8).unwrap();
//! let executed = stage_map::execute_set_for_resume(8).unwrap();
//!
//! assert_eq!(skipped.len(), 8);
//! assert_eq!(executed.iter().map(|s| s.get()).collect::<Vec<_>>(), vec![8, 9, 10]);
//! assert!(stage_map::upstream_of(11).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StageError;

/// Highest stage number in the pipeline.
pub const LAST_STAGE: u8 = 10;

/// Number of stages in the pipeline.
pub const STAGE_COUNT: usize = LAST_STAGE as usize + 1;

/// Names of the stages, indexed by stage number.
const STAGE_NAMES: [&str; STAGE_COUNT] = [
    "enhancement",
    "intake",
    "router",
    "workers",
    "normalize",
    "dedupe",
    "rank",
    "validate",
    "top_candidates",
    "aggregate",
    "results",
];

/// A validated pipeline stage number in `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct StageNumber(u8);

impl StageNumber {
    pub const FIRST: StageNumber = StageNumber(0);
    pub const LAST: StageNumber = StageNumber(LAST_STAGE);

    pub const NORMALIZE: StageNumber = StageNumber(4);
    pub const DEDUPE: StageNumber = StageNumber(5);
    pub const TOP_CANDIDATES: StageNumber = StageNumber(8);

    /// Validate a stage number.
    pub fn new(value: i64) -> Result<Self, StageError> {
        if (0..=LAST_STAGE as i64).contains(&value) {
            Ok(StageNumber(value as u8))
        } else {
            Err(StageError::invalid(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Short stage name, e.g. `dedupe`.
    pub fn name(self) -> &'static str {
        STAGE_NAMES[self.index()]
    }

    /// Canonical stage id, e.g. `05_dedupe`.
    pub fn id(self) -> String {
        format!("{:02}_{}", self.0, self.name())
    }

    pub fn previous(self) -> Option<StageNumber> {
        self.0.checked_sub(1).map(StageNumber)
    }

    /// All stages in ascending order.
    pub fn all() -> impl Iterator<Item = StageNumber> {
        (0..=LAST_STAGE).map(StageNumber)
    }

    /// Stages in `from..=to`, empty when `to < from`.
    pub fn range(from: StageNumber, to: StageNumber) -> Vec<StageNumber> {
        (from.0..=to.0).map(StageNumber).collect()
    }
}

impl fmt::Display for StageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for StageNumber {
    type Error = StageError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        StageNumber::new(value)
    }
}

impl From<StageNumber> for u8 {
    fn from(value: StageNumber) -> Self {
        value.0
    }
}

/// Conversion of raw stage numbers into a validated [`StageNumber`].
pub trait IntoStageNumber {
    fn into_stage_number(self) -> Result<StageNumber, StageError>;
}

impl IntoStageNumber for StageNumber {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        Ok(self)
    }
}

impl IntoStageNumber for i64 {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        StageNumber::new(self)
    }
}

impl IntoStageNumber for i32 {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        StageNumber::new(self as i64)
    }
}

impl IntoStageNumber for u8 {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        StageNumber::new(self as i64)
    }
}

impl IntoStageNumber for usize {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        i64::try_from(self)
            .map_err(|_| StageError::invalid(self))
            .and_then(StageNumber::new)
    }
}

impl IntoStageNumber for f64 {
    fn into_stage_number(self) -> Result<StageNumber, StageError> {
        if !self.is_finite() || self.fract() != 0.0 {
            return Err(StageError::invalid(self));
        }
        if self < 0.0 || self > LAST_STAGE as f64 {
            return Err(StageError::invalid(self));
        }
        Ok(StageNumber(self as u8))
    }
}

/// The stage whose checkpoint stage `n` consumes, or `None` for stage 0.
pub fn upstream_of(n: impl IntoStageNumber) -> Result<Option<StageNumber>, StageError> {
    Ok(n.into_stage_number()?.previous())
}

/// Every stage that must have completed before stage `n` can run: `[0..n-1]`.
pub fn all_upstream(n: impl IntoStageNumber) -> Result<Vec<StageNumber>, StageError> {
    let n = n.into_stage_number()?;
    Ok((0..n.get()).map(StageNumber).collect())
}

/// Every stage that consumes, directly or transitively, stage `n`'s output: `[n+1..10]`.
pub fn all_downstream(n: impl IntoStageNumber) -> Result<Vec<StageNumber>, StageError> {
    let n = n.into_stage_number()?;
    Ok((n.get() + 1..=LAST_STAGE).map(StageNumber).collect())
}

/// Stages skipped when resuming from `from`.
pub fn skip_set_for_resume(from: impl IntoStageNumber) -> Result<Vec<StageNumber>, StageError> {
    all_upstream(from)
}

/// Stages executed when resuming from `from`: `[from..10]`.
pub fn execute_set_for_resume(from: impl IntoStageNumber) -> Result<Vec<StageNumber>, StageError> {
    let from = from.into_stage_number()?;
    Ok(StageNumber::range(from, StageNumber::LAST))
}

/// Whether stage `a` depends (transitively) on stage `b`.
pub fn depends_on(a: impl IntoStageNumber, b: impl IntoStageNumber) -> Result<bool, StageError> {
    let a = a.into_stage_number()?;
    let b = b.into_stage_number()?;
    Ok(b < a)
}

/// Canonical id for a raw stage number.
pub fn stage_id(n: impl IntoStageNumber) -> Result<String, StageError> {
    Ok(n.into_stage_number()?.id())
}

/// Parse a stage id such as `07_validate` back into its number.
///
/// Both the numeric prefix and the name must match the catalogue.
pub fn parse_stage_id(id: &str) -> Result<StageNumber, StageError> {
    let (prefix, name) = id.split_once('_').ok_or_else(|| StageError::invalid(id))?;
    let number: i64 = prefix.parse().map_err(|_| StageError::invalid(id))?;
    let stage = StageNumber::new(number)?;
    if prefix.len() != 2 || stage.name() != name {
        return Err(StageError::invalid(id));
    }
    Ok(stage)
}

/// Check that an id carries the expected `NN_` prefix for `number`.
pub fn id_matches_number(id: &str, number: StageNumber) -> bool {
    id.starts_with(&format!("{:02}_", number.get()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn numbers(stages: &[StageNumber]) -> Vec<u8> {
        stages.iter().map(|s| s.get()).collect()
    }

    #[test]
    fn test_stage_ids_follow_catalogue() {
        let ids: Vec<String> = StageNumber::all().map(|s| s.id()).collect();
        assert_eq!(ids.len(), STAGE_COUNT);
        assert_eq!(ids[0], "00_enhancement");
        assert_eq!(ids[5], "05_dedupe");
        assert_eq!(ids[8], "08_top_candidates");
        assert_eq!(ids[10], "10_results");
    }

    #[test]
    fn test_upstream_of() {
        assert_eq!(upstream_of(0).unwrap(), None);
        assert_eq!(upstream_of(1).unwrap(), Some(StageNumber::FIRST));
        assert_eq!(upstream_of(10).unwrap().map(|s| s.get()), Some(9));
    }

    #[test]
    fn test_all_upstream_and_downstream() {
        assert!(all_upstream(0).unwrap().is_empty());
        assert_eq!(numbers(&all_upstream(3).unwrap()), vec![0, 1, 2]);
        assert_eq!(numbers(&all_downstream(8).unwrap()), vec![9, 10]);
        assert!(all_downstream(10).unwrap().is_empty());
    }

    #[test]
    fn test_resume_sets_partition_pipeline_for_every_stage() {
        let everything: BTreeSet<u8> = (0..=LAST_STAGE).collect();

        for n in 0..=LAST_STAGE {
            let skip = numbers(&skip_set_for_resume(n).unwrap());
            let execute = numbers(&execute_set_for_resume(n).unwrap());

            assert_eq!(execute[0], n, "execute set must start at {}", n);

            let skip_set: BTreeSet<u8> = skip.iter().copied().collect();
            let execute_set: BTreeSet<u8> = execute.iter().copied().collect();
            assert!(skip_set.is_disjoint(&execute_set), "overlap for {}", n);

            let union: BTreeSet<u8> = skip_set.union(&execute_set).copied().collect();
            assert_eq!(union, everything, "union incomplete for {}", n);
        }
    }

    #[test]
    fn test_depends_on() {
        assert!(depends_on(5, 4).unwrap());
        assert!(depends_on(5, 0).unwrap());
        assert!(!depends_on(5, 5).unwrap());
        assert!(!depends_on(4, 5).unwrap());
    }

    #[test]
    fn test_invalid_integer_stage_numbers_rejected_everywhere() {
        for value in [-1i64, 11, 100, i64::MIN, i64::MAX] {
            assert!(upstream_of(value).is_err(), "upstream_of({})", value);
            assert!(all_upstream(value).is_err(), "all_upstream({})", value);
            assert!(all_downstream(value).is_err(), "all_downstream({})", value);
            assert!(skip_set_for_resume(value).is_err(), "skip_set({})", value);
            assert!(execute_set_for_resume(value).is_err(), "execute_set({})", value);
            assert!(depends_on(value, 0).is_err(), "depends_on({}, 0)", value);
            assert!(depends_on(0, value).is_err(), "depends_on(0, {})", value);
        }
    }

    #[test]
    fn test_invalid_float_stage_numbers_rejected_everywhere() {
        for value in [2.5f64, -0.5, 10.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -1.0, 11.0] {
            let err = upstream_of(value).unwrap_err();
            assert!(matches!(err, StageError::InvalidStageNumber { .. }));
            assert!(all_upstream(value).is_err());
            assert!(all_downstream(value).is_err());
            assert!(skip_set_for_resume(value).is_err());
            assert!(execute_set_for_resume(value).is_err());
            assert!(depends_on(value, 1.0).is_err());
        }
    }

    #[test]
    fn test_domain_error_names_the_value() {
        let err = upstream_of(42).unwrap_err();
        assert!(err.to_string().contains("42"));

        let err = upstream_of(3.5).unwrap_err();
        assert!(err.to_string().contains("3.5"));
    }

    #[test]
    fn test_integral_floats_accepted() {
        assert_eq!(upstream_of(4.0).unwrap().map(|s| s.get()), Some(3));
        assert_eq!(execute_set_for_resume(10.0).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_stage_id() {
        assert_eq!(parse_stage_id("07_validate").unwrap().get(), 7);
        assert_eq!(parse_stage_id("10_results").unwrap().get(), 10);
        assert!(parse_stage_id("7_validate").is_err());
        assert!(parse_stage_id("07_rank").is_err());
        assert!(parse_stage_id("11_extra").is_err());
        assert!(parse_stage_id("validate").is_err());
    }

    #[test]
    fn test_stage_number_serde() {
        let n: StageNumber = serde_json::from_str("8").unwrap();
        assert_eq!(n.get(), 8);
        assert!(serde_json::from_str::<StageNumber>("12").is_err());
        assert_eq!(serde_json::to_string(&n).unwrap(), "8");
    }
}
