// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::stage_map::{id_matches_number, StageNumber, STAGE_COUNT};
use crate::errors::StageError;
use crate::traits::Stage;

/// Fixed-size stage table indexed by stage number.
///
/// Registration is one-to-one: each number holds at most one stage, and the
/// stage's id must carry that number's `NN_` prefix.
#[derive(Default, Clone)]
pub struct StageRegistry {
    slots: [Option<Arc<dyn Stage>>; STAGE_COUNT],
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: Arc<dyn Stage>) -> Result<(), StageError> {
        let number = stage.number();
        let stage_id = stage.id();

        if !id_matches_number(&stage_id, number) {
            return Err(StageError::IdMismatch {
                stage_number: number.get(),
                stage_id,
            });
        }

        let slot = &mut self.slots[number.index()];
        if slot.is_some() {
            return Err(StageError::DuplicateRegistration {
                stage_number: number.get(),
                stage_id,
            });
        }

        *slot = Some(stage);
        Ok(())
    }

    pub fn get(&self, number: StageNumber) -> Result<&Arc<dyn Stage>, StageError> {
        self.slots[number.index()]
            .as_ref()
            .ok_or(StageError::NotRegistered {
                stage_number: number.get(),
            })
    }

    pub fn is_registered(&self, number: StageNumber) -> bool {
        self.slots[number.index()].is_some()
    }

    /// Every stage number has a registered stage.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.slots.iter().flatten().map(|s| s.id()).collect();
        f.debug_struct("StageRegistry")
            .field("stage_count", &ids.len())
            .field("stage_ids", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubStage;

    fn stage(n: i64) -> StageNumber {
        StageNumber::new(n).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = StageRegistry::new();
        registry.register(Arc::new(StubStage::new(stage(3)))).unwrap();

        assert!(registry.is_registered(stage(3)));
        assert_eq!(registry.get(stage(3)).unwrap().id(), "03_workers");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_complete());
    }

    #[test]
    fn test_registration_errors() {
        struct TestCase {
            name: &'static str,
            setup: Vec<Arc<dyn Stage>>,
            candidate: Arc<dyn Stage>,
            expected: StageError,
        }

        let test_cases = vec![
            TestCase {
                name: "duplicate number",
                setup: vec![Arc::new(StubStage::new(stage(2)))],
                candidate: Arc::new(StubStage::new(stage(2))),
                expected: StageError::DuplicateRegistration {
                    stage_number: 2,
                    stage_id: "02_router".to_string(),
                },
            },
            TestCase {
                name: "id prefix disagrees with number",
                setup: vec![],
                candidate: Arc::new(StubStage::new(stage(4)).with_id("05_dedupe")),
                expected: StageError::IdMismatch {
                    stage_number: 4,
                    stage_id: "05_dedupe".to_string(),
                },
            },
        ];

        for case in test_cases {
            let mut registry = StageRegistry::new();
            for existing in case.setup {
                registry.register(existing).unwrap();
            }
            let error = registry.register(case.candidate).unwrap_err();
            assert_eq!(error, case.expected, "{}", case.name);
        }
    }

    #[test]
    fn test_missing_stage_is_reported() {
        let registry = StageRegistry::new();
        let error = registry.get(stage(7)).err().unwrap();
        assert_eq!(error, StageError::NotRegistered { stage_number: 7 });
    }

    #[test]
    fn test_complete_registry() {
        let mut registry = StageRegistry::new();
        for n in StageNumber::all() {
            registry.register(Arc::new(StubStage::new(n))).unwrap();
        }
        assert!(registry.is_complete());
        assert_eq!(registry.len(), STAGE_COUNT);
    }
}
