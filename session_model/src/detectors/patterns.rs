//! Regex-backed default detector.

use regex::Regex;

use super::{CauseDetector, Detection, EffectDetector};
use crate::error::{SessionError, SessionResult};

/// Default cause catalogue: (kind, pattern, mass). First match wins.
pub const DEFAULT_CAUSE_RULES: &[(&str, &str, f64)] = &[
    (
        "attack",
        r"(?i)\b(i|we)\s+(attack|strike|swing at|shoot|stab|hit|charge)\b",
        1.0,
    ),
    ("spell", r"(?i)\b(i|we)\s+(cast|channel|invoke)\b", 1.0),
    (
        "check",
        r"(?i)\b(i|we)\s+(search|investigate|inspect|examine|listen|look\s+(around|for|at))\b",
        1.0,
    ),
    ("request", r"(?i)\b(can|could|may)\s+(i|we)\b", 1.0),
    (
        "action",
        r"(?i)\b(i|we)\s+(try|attempt|open|grab|take|climb|jump|sneak|run|go|pick|push|pull|use|walk|draw|hide)\b",
        1.0,
    ),
    ("question", r"\?\s*$", 0.5),
];

/// Default effect catalogue: (kind, pattern, mass). First match wins.
pub const DEFAULT_EFFECT_RULES: &[(&str, &str, f64)] = &[
    (
        "roll_call",
        r"(?i)\b(roll|make)\b.*\b(check|save|saving throw|initiative)\b",
        0.8,
    ),
    ("damage", r"(?i)\b\d+\s+(\w+\s+)?damage\b", 1.0),
    (
        "outcome",
        r"(?i)\b(succeed|succeeds|success|fail|fails|failure|hits|misses|manage to)\b",
        1.0,
    ),
    (
        "narration",
        r"(?i)\byou\s+(see|notice|find|hear|spot|feel|smell)\b|\b(opens?|swings?\s+open|collapses|appears|reveals?)\b",
        1.0,
    ),
    (
        "answer",
        r"(?i)^\s*(yes|no|yeah|yep|nope|nah|sure|of course)\b",
        0.6,
    ),
];

/// Yes/no answer recognizer.
pub const DEFAULT_ANSWER_PATTERN: &str = r"(?i)^\s*(yes|no|yeah|yep|nope|nah|sure|absolutely|of course)\b";

/// A single compiled classification rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub kind: String,
    pub regex: Regex,
    pub mass: f64,
}

impl PatternRule {
    /// Compile a rule.
    pub fn new(kind: impl Into<String>, pattern: &str, mass: f64) -> SessionResult<Self> {
        let kind = kind.into();
        let regex = Regex::new(pattern).map_err(|source| SessionError::InvalidPattern {
            kind: kind.clone(),
            source,
        })?;
        Ok(Self { kind, regex, mass })
    }

    fn detect(&self, text: &str) -> Option<Detection> {
        self.regex
            .is_match(text)
            .then(|| Detection::new(self.kind.clone(), self.mass))
    }
}

/// Ordered rule lists for causes and effects.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    cause_rules: Vec<PatternRule>,
    effect_rules: Vec<PatternRule>,
    answer: Regex,
}

impl PatternDetector {
    /// Build a detector from custom catalogues.
    pub fn new(
        cause_rules: &[(&str, &str, f64)],
        effect_rules: &[(&str, &str, f64)],
        answer_pattern: &str,
    ) -> SessionResult<Self> {
        let compile = |rules: &[(&str, &str, f64)]| {
            rules
                .iter()
                .map(|(kind, pattern, mass)| PatternRule::new(*kind, pattern, *mass))
                .collect::<SessionResult<Vec<_>>>()
        };

        let answer = Regex::new(answer_pattern).map_err(|source| SessionError::InvalidPattern {
            kind: "answer".to_string(),
            source,
        })?;

        Ok(Self {
            cause_rules: compile(cause_rules)?,
            effect_rules: compile(effect_rules)?,
            answer,
        })
    }

    /// Build the detector with the default catalogue.
    pub fn with_defaults() -> SessionResult<Self> {
        Self::new(DEFAULT_CAUSE_RULES, DEFAULT_EFFECT_RULES, DEFAULT_ANSWER_PATTERN)
    }

    pub fn cause_rules(&self) -> &[PatternRule] {
        &self.cause_rules
    }

    pub fn effect_rules(&self) -> &[PatternRule] {
        &self.effect_rules
    }
}

impl CauseDetector for PatternDetector {
    fn detect_cause(&self, text: &str) -> Option<Detection> {
        self.cause_rules.iter().find_map(|rule| rule.detect(text))
    }
}

impl EffectDetector for PatternDetector {
    fn detect_effect(&self, text: &str) -> Option<Detection> {
        self.effect_rules.iter().find_map(|rule| rule.detect(text))
    }

    fn is_answer(&self, text: &str) -> bool {
        self.answer.is_match(text)
    }
}
