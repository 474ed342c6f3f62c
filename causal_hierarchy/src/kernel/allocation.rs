//! Cause/effect scanning and exclusive mass-ordered allocation.

use std::collections::{BTreeMap, BTreeSet};

use session_model::{CauseDetector, EffectDetector, TranscriptEntry};

use super::{AllocationTrace, KernelInput};
use crate::config::KernelParams;
use crate::evidence::hill_lexical_strength;
use crate::lexical::{LexicalScorer, TokenSet};
use crate::model::{CausalLink, SingletonNode};

/// A detected cause awaiting allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedCause {
    pub line_index: usize,
    pub actor_id: String,
    pub text: String,
    pub kind: String,
    pub mass: f64,
}

/// A detected effect on a DM line.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedEffect {
    pub line_index: usize,
    pub text: String,
    pub kind: String,
    pub mass: f64,
    /// The line reads as a yes/no answer.
    pub is_answer: bool,
}

/// Eligible DM lines of a session, with the effects detected on them.
#[derive(Debug, Clone, Default)]
pub struct DmTurns {
    /// Line indices of eligible DM lines, ascending.
    pub turns: Vec<usize>,
    /// Detected effects keyed by line.
    pub effects: BTreeMap<usize, DetectedEffect>,
}

impl DmTurns {
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// The first `k` DM turns strictly after `line_index`, as
    /// `(dm_turn_distance, line_index)` with the first turn at distance 1.
    pub fn window_after(&self, line_index: usize, k: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let start = self.turns.partition_point(|&turn| turn <= line_index);
        self.turns[start..]
            .iter()
            .take(k)
            .enumerate()
            .map(|(offset, line)| (offset + 1, *line))
    }
}

/// Transcript lines in line order, first occurrence of each index only.
fn ordered_entries(transcript: &[TranscriptEntry]) -> Vec<&TranscriptEntry> {
    let mut entries: Vec<_> = transcript.iter().collect();
    entries.sort_by_key(|e| e.line_index);
    entries.dedup_by_key(|e| e.line_index);
    entries
}

/// Collect causes from eligible, non-DM lines spoken by registered actors.
pub fn scan_causes<D>(input: &KernelInput<'_>, detector: &D) -> Vec<DetectedCause>
where
    D: CauseDetector + ?Sized,
{
    ordered_entries(input.transcript)
        .into_iter()
        .filter(|entry| input.mask.is_eligible(entry.line_index))
        .filter(|entry| !input.dm_speakers.is_dm(&entry.author_name))
        .filter_map(|entry| {
            let actor = input.actors.match_author(&entry.author_name)?;
            let detection = detector.detect_cause(&entry.content)?;
            Some(DetectedCause {
                line_index: entry.line_index,
                actor_id: actor.id.clone(),
                text: entry.content.clone(),
                kind: detection.kind,
                mass: detection.mass.max(0.0),
            })
        })
        .collect()
}

/// Collect eligible DM turns and the effects detected on them.
pub fn scan_dm_turns<D>(input: &KernelInput<'_>, detector: &D) -> DmTurns
where
    D: EffectDetector + ?Sized,
{
    let mut dm_turns = DmTurns::default();

    for entry in ordered_entries(input.transcript) {
        if !input.mask.is_eligible(entry.line_index) || !input.dm_speakers.is_dm(&entry.author_name) {
            continue;
        }
        dm_turns.turns.push(entry.line_index);

        if let Some(detection) = detector.detect_effect(&entry.content) {
            dm_turns.effects.insert(
                entry.line_index,
                DetectedEffect {
                    line_index: entry.line_index,
                    text: entry.content.clone(),
                    kind: detection.kind,
                    mass: detection.mass.max(0.0),
                    is_answer: detector.is_answer(&entry.content),
                },
            );
        }
    }

    dm_turns
}

/// A candidate effect scored against one cause.
#[derive(Debug, Clone)]
struct ScoredEffect<'a> {
    effect: &'a DetectedEffect,
    distance: usize,
    score: f64,
}

/// Result of the allocation pass, before boosting.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub links: Vec<CausalLink>,
    pub traces: Vec<AllocationTrace>,
    pub unclaimed_effects: Vec<SingletonNode>,
}

/// Score a cause/effect pair: `hill(d) * (1 + lexical * beta_lex) + answer_boost`.
pub fn cause_effect_score(
    distance: usize,
    lexical: f64,
    is_answer: bool,
    params: &KernelParams,
) -> f64 {
    let answer_boost = if is_answer { params.answer_boost } else { 0.0 };
    hill_lexical_strength(
        distance as f64,
        params.decay.tau(),
        params.decay.p,
        params.beta_lex,
        lexical,
    ) + answer_boost
}

/// Allocate effects to causes, heaviest cause first.
///
/// Each cause claims at most one effect and each effect is claimed by at most
/// one cause. Every cause yields a link, claimed or not.
pub fn allocate(
    input: &KernelInput<'_>,
    causes: &[DetectedCause],
    dm_turns: &DmTurns,
    params: &KernelParams,
    scorer: &LexicalScorer,
) -> Allocation {
    let effect_tokens: BTreeMap<usize, TokenSet> = dm_turns
        .effects
        .iter()
        .map(|(line, effect)| (*line, scorer.tokenize(&effect.text)))
        .collect();

    let mut order: Vec<&DetectedCause> = causes.iter().collect();
    order.sort_by(|a, b| {
        b.mass
            .total_cmp(&a.mass)
            .then_with(|| a.line_index.cmp(&b.line_index))
    });

    let mut claimed_effects: BTreeSet<usize> = BTreeSet::new();
    let mut allocation = Allocation::default();

    for cause in order {
        let cause_tokens = scorer.tokenize(&cause.text);

        let mut candidates: Vec<ScoredEffect<'_>> = dm_turns
            .window_after(cause.line_index, params.k_local)
            .filter_map(|(distance, line)| {
                let effect = dm_turns.effects.get(&line)?;
                let lexical = effect_tokens
                    .get(&line)
                    .map(|tokens| scorer.score(&cause_tokens, tokens))
                    .unwrap_or(0.0);
                Some(ScoredEffect {
                    effect,
                    distance,
                    score: cause_effect_score(distance, lexical, effect.is_answer, params),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.distance.cmp(&b.distance))
                .then_with(|| a.effect.line_index.cmp(&b.effect.line_index))
        });

        let best = candidates
            .iter()
            .find(|c| !claimed_effects.contains(&c.effect.line_index));
        let threshold = params.threshold(cause.mass);

        let mut link = CausalLink::from_cause(
            input.session_id,
            cause.line_index,
            cause.text.clone(),
            cause.kind.clone(),
            cause.mass,
        )
        .with_actor(cause.actor_id.clone())
        .with_created_at(input.created_at_ms);

        let claimed = match best {
            Some(best) if best.score >= threshold => {
                claimed_effects.insert(best.effect.line_index);
                link = link.with_effect(
                    best.effect.line_index,
                    best.effect.text.clone(),
                    best.effect.kind.clone(),
                    best.effect.mass,
                    best.score,
                    best.distance,
                );
                true
            }
            _ => false,
        };

        allocation.traces.push(AllocationTrace {
            cause_index: cause.line_index,
            cause_mass: cause.mass,
            candidates_considered: candidates.len(),
            best_effect_index: best.map(|b| b.effect.line_index),
            best_score: best.map(|b| b.score),
            threshold,
            claimed,
        });
        allocation.links.push(link);
    }

    allocation.links.sort_by_key(|link| link.cause_anchor_index);
    allocation.unclaimed_effects = dm_turns
        .effects
        .values()
        .filter(|effect| !claimed_effects.contains(&effect.line_index))
        .map(|effect| {
            SingletonNode::effect(
                effect.line_index,
                effect.text.clone(),
                effect.kind.clone(),
                effect.mass,
            )
        })
        .collect();

    allocation
}
