//! Input consistency checks.
//!
//! Inconsistent input never aborts a run: lookups are fail-closed. Each
//! problem is reported once per run so callers can surface it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::HierarchyInput;

/// A recoverable input problem found before extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The mask was compiled for another session.
    MaskSessionMismatch {
        session_id: String,
        mask_session_id: String,
    },
    /// Transcript lines past the end of the mask; they are treated as ineligible.
    MaskShorterThanTranscript {
        mask_len: usize,
        uncovered_lines: usize,
    },
    /// First entry whose `line_index` differs from its position.
    LineIndexMismatch { position: usize, line_index: usize },
    /// A line index occurs more than once; only the first entry is used.
    DuplicateLineIndex { line_index: usize, occurrences: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MaskSessionMismatch {
                session_id,
                mask_session_id,
            } => write!(
                f,
                "eligibility mask belongs to session {mask_session_id}, not {session_id}"
            ),
            Diagnostic::MaskShorterThanTranscript {
                mask_len,
                uncovered_lines,
            } => write!(
                f,
                "eligibility mask covers {mask_len} lines; {uncovered_lines} transcript lines treated as ineligible"
            ),
            Diagnostic::LineIndexMismatch {
                position,
                line_index,
            } => write!(f, "transcript entry {position} has line_index {line_index}"),
            Diagnostic::DuplicateLineIndex {
                line_index,
                occurrences,
            } => write!(f, "line_index {line_index} appears {occurrences} times"),
        }
    }
}

/// Check transcript and mask against each other; each finding is logged once.
pub fn check_input(input: &HierarchyInput<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if input.mask.session_id != input.session_id {
        diagnostics.push(Diagnostic::MaskSessionMismatch {
            session_id: input.session_id.to_string(),
            mask_session_id: input.mask.session_id.clone(),
        });
    }

    let uncovered_lines = input
        .transcript
        .iter()
        .filter(|entry| entry.line_index >= input.mask.len())
        .count();
    if uncovered_lines > 0 {
        diagnostics.push(Diagnostic::MaskShorterThanTranscript {
            mask_len: input.mask.len(),
            uncovered_lines,
        });
    }

    if let Some((position, entry)) = input
        .transcript
        .iter()
        .enumerate()
        .find(|(position, entry)| entry.line_index != *position)
    {
        diagnostics.push(Diagnostic::LineIndexMismatch {
            position,
            line_index: entry.line_index,
        });
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for entry in input.transcript {
        if !seen.insert(entry.line_index) {
            duplicates.insert(entry.line_index);
        }
    }
    for line_index in duplicates {
        let occurrences = input
            .transcript
            .iter()
            .filter(|entry| entry.line_index == line_index)
            .count();
        diagnostics.push(Diagnostic::DuplicateLineIndex {
            line_index,
            occurrences,
        });
    }

    for diagnostic in &diagnostics {
        warn!(session_id = input.session_id, %diagnostic, "input inconsistency");
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_model::{
        transcript_from_pairs, ActorRegistry, DmSpeakers, EligibilityMask, TranscriptEntry,
    };

    fn check(transcript: &[TranscriptEntry], mask: &EligibilityMask) -> Vec<Diagnostic> {
        let actors = ActorRegistry::default();
        let dm = DmSpeakers::default();
        check_input(&HierarchyInput {
            session_id: "s1",
            transcript,
            mask,
            actors: &actors,
            dm_speakers: &dm,
            created_at_ms: 0,
        })
    }

    #[test]
    fn test_consistent_input() {
        let transcript = transcript_from_pairs([("Ayla", "I jump"), ("DM", "You land")]);
        let mask = EligibilityMask::all_eligible("s1", 2);
        assert!(check(&transcript, &mask).is_empty());
    }

    #[test]
    fn test_short_mask_and_wrong_session() {
        let transcript = transcript_from_pairs([("Ayla", "I jump"), ("DM", "You land")]);
        let mask = EligibilityMask::all_eligible("s2", 1);
        let diagnostics = check(&transcript, &mask);

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(diagnostics[0], Diagnostic::MaskSessionMismatch { .. }));
        assert_eq!(
            diagnostics[1],
            Diagnostic::MaskShorterThanTranscript {
                mask_len: 1,
                uncovered_lines: 1
            }
        );
    }

    #[test]
    fn test_index_problems() {
        let transcript = vec![
            TranscriptEntry::new(0, "Ayla", "I jump"),
            TranscriptEntry::new(0, "DM", "You land"),
        ];
        let mask = EligibilityMask::all_eligible("s1", 2);
        let diagnostics = check(&transcript, &mask);

        assert!(diagnostics.contains(&Diagnostic::LineIndexMismatch {
            position: 1,
            line_index: 0
        }));
        assert!(diagnostics.contains(&Diagnostic::DuplicateLineIndex {
            line_index: 0,
            occurrences: 2
        }));
    }
}
