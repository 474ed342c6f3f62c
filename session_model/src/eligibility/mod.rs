//! Eligibility mask - the line-level gate produced by the chunk classifier.
//!
//! The classifier itself (combat/OOC detection) lives outside this workspace.
//! Lookups are fail-closed: any index without an explicit `true` entry is
//! treated as ineligible.

use serde::{Deserialize, Serialize};

/// A span of lines excluded from causal extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedRange {
    /// First excluded line (inclusive).
    pub start_index: usize,
    /// Last excluded line (inclusive).
    pub end_index: usize,
    /// Why the span was excluded (e.g. "combat", "ooc").
    #[serde(default)]
    pub reason: String,
}

impl ExcludedRange {
    pub fn new(start_index: usize, end_index: usize, reason: impl Into<String>) -> Self {
        Self {
            start_index,
            end_index,
            reason: reason.into(),
        }
    }

    /// Check if a line falls inside this range.
    pub fn contains(&self, line_index: usize) -> bool {
        line_index >= self.start_index && line_index <= self.end_index
    }
}

/// Compiled eligibility for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityMask {
    pub session_id: String,

    /// `eligible_mask[i]` is true iff line `i` may be used.
    pub eligible_mask: Vec<bool>,

    #[serde(default)]
    pub excluded_ranges: Vec<ExcludedRange>,

    #[serde(default)]
    pub compiled_at_ms: i64,
}

impl EligibilityMask {
    /// A mask that admits every one of `line_count` lines.
    pub fn all_eligible(session_id: impl Into<String>, line_count: usize) -> Self {
        Self {
            session_id: session_id.into(),
            eligible_mask: vec![true; line_count],
            excluded_ranges: Vec::new(),
            compiled_at_ms: 0,
        }
    }

    /// Build a mask from excluded ranges; ranges past `line_count` are clipped.
    pub fn from_ranges(
        session_id: impl Into<String>,
        line_count: usize,
        excluded_ranges: Vec<ExcludedRange>,
        compiled_at_ms: i64,
    ) -> Self {
        let mut eligible_mask = vec![true; line_count];
        for range in &excluded_ranges {
            if range.start_index >= line_count {
                continue;
            }
            let end = range.end_index.min(line_count - 1);
            for slot in &mut eligible_mask[range.start_index..=end] {
                *slot = false;
            }
        }

        Self {
            session_id: session_id.into(),
            eligible_mask,
            excluded_ranges,
            compiled_at_ms,
        }
    }

    /// Fail-closed lookup.
    pub fn is_eligible(&self, line_index: usize) -> bool {
        self.eligible_mask.get(line_index).copied().unwrap_or(false)
    }

    /// Number of lines the mask covers.
    pub fn len(&self) -> usize {
        self.eligible_mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eligible_mask.is_empty()
    }

    /// Number of usable lines.
    pub fn eligible_count(&self) -> usize {
        self.eligible_mask.iter().filter(|e| **e).count()
    }
}
