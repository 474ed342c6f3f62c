//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use causal_hierarchy::HierarchyInput;
use session_model::{
    ActorLike, ActorRegistry, CauseDetector, Detection, DmSpeakers, EffectDetector,
    EligibilityMask, TranscriptEntry,
};

pub const SESSION_ID: &str = "session-1";
pub const CREATED_AT_MS: i64 = 1_700_000_000_000;

/// Detector that classifies lines by exact text.
#[derive(Debug, Default, Clone)]
pub struct TableDetector {
    causes: BTreeMap<String, Detection>,
    effects: BTreeMap<String, Detection>,
}

impl TableDetector {
    pub fn cause(mut self, text: &str, mass: f64) -> Self {
        self.causes.insert(text.to_string(), Detection::new("action", mass));
        self
    }

    pub fn effect(mut self, text: &str, mass: f64) -> Self {
        self.effects.insert(text.to_string(), Detection::new("narration", mass));
        self
    }
}

impl CauseDetector for TableDetector {
    fn detect_cause(&self, text: &str) -> Option<Detection> {
        self.causes.get(text).cloned()
    }
}

impl EffectDetector for TableDetector {
    fn detect_effect(&self, text: &str) -> Option<Detection> {
        self.effects.get(text).cloned()
    }
}

/// Owned session data that a `HierarchyInput` borrows from.
pub struct SessionFixture {
    pub transcript: Vec<TranscriptEntry>,
    pub mask: EligibilityMask,
    pub actors: ActorRegistry,
    pub dm_speakers: DmSpeakers,
}

impl SessionFixture {
    /// All lines eligible; Ayla and Bram registered; "DM" speaks for the table.
    pub fn new(lines: &[(&str, &str)]) -> Self {
        let transcript: Vec<TranscriptEntry> = lines
            .iter()
            .enumerate()
            .map(|(i, (author, content))| TranscriptEntry::new(i, *author, *content))
            .collect();
        let mask = EligibilityMask::all_eligible(SESSION_ID, transcript.len());
        let actors = ActorRegistry::new(vec![
            ActorLike::new("pc-ayla", "Ayla").with_alias("Ayla the Bold"),
            ActorLike::new("pc-bram", "Bram"),
        ])
        .unwrap();

        Self {
            transcript,
            mask,
            actors,
            dm_speakers: DmSpeakers::new(["DM"]),
        }
    }

    pub fn with_mask(mut self, eligible: Vec<bool>) -> Self {
        self.mask.eligible_mask = eligible;
        self
    }

    pub fn input(&self) -> HierarchyInput<'_> {
        HierarchyInput {
            session_id: SESSION_ID,
            transcript: &self.transcript,
            mask: &self.mask,
            actors: &self.actors,
            dm_speakers: &self.dm_speakers,
            created_at_ms: CREATED_AT_MS,
        }
    }
}
