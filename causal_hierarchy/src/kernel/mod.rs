//! Leaf extraction kernel - turns a transcript into Round-1 links.
//!
//! The kernel works as follows:
//! 1. **Causes**: eligible, non-DM lines spoken by a registered actor are run
//!    through the cause detector
//! 2. **Effects**: eligible DM lines are run through the effect detector
//! 3. **Priority**: causes are ordered by mass (desc), then line (asc)
//! 4. **Allocation**: each cause claims its best unclaimed effect among the
//!    next `k_local` DM turns if the score clears its threshold
//! 5. **Boosting**: a first neighbor-influence pass over the finished links
//!
//! Distance inside the kernel counts DM turns, not raw lines. Every later
//! phase uses raw center-index distance; the asymmetry is intentional.

mod allocation;
mod boost;

pub use allocation::*;
pub use boost::*;

use serde::{Deserialize, Serialize};
use session_model::{
    ActorRegistry, CauseDetector, DmSpeakers, EffectDetector, EligibilityMask, TranscriptEntry,
};
use tracing::debug;

use crate::config::{KernelParams, TierThresholds};
use crate::lexical::LexicalScorer;
use crate::model::{NeighborEdgeTrace, SingletonNode};
use crate::model::CausalLink;

/// Everything the kernel reads for one session.
#[derive(Debug, Clone, Copy)]
pub struct KernelInput<'a> {
    pub session_id: &'a str,
    pub transcript: &'a [TranscriptEntry],
    pub mask: &'a EligibilityMask,
    pub actors: &'a ActorRegistry,
    pub dm_speakers: &'a DmSpeakers,
    pub created_at_ms: i64,
}

/// Allocation outcome for one cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTrace {
    pub cause_index: usize,
    pub cause_mass: f64,
    /// Detected effects inside the DM-turn window.
    pub candidates_considered: usize,
    /// Best candidate not yet claimed by a heavier cause.
    pub best_effect_index: Option<usize>,
    pub best_score: Option<f64>,
    pub threshold: f64,
    pub claimed: bool,
}

/// Round-1 output of the kernel.
#[derive(Debug, Clone, Default)]
pub struct KernelOutput {
    /// One link per detected cause, ordered by cause line.
    pub links: Vec<CausalLink>,
    /// Allocation traces in allocation-priority order.
    pub allocation: Vec<AllocationTrace>,
    /// Detected effects no cause claimed, ordered by line.
    pub unclaimed_effects: Vec<SingletonNode>,
    /// Contributions of the neighbor boosting pass.
    pub neighbor_edges: Vec<NeighborEdgeTrace>,
}

impl KernelOutput {
    pub fn claimed_count(&self) -> usize {
        self.links.iter().filter(|l| l.claimed).count()
    }
}

/// Run leaf extraction for one session.
pub fn extract_links<D>(
    input: &KernelInput<'_>,
    params: &KernelParams,
    tiers: &TierThresholds,
    scorer: &LexicalScorer,
    detector: &D,
) -> KernelOutput
where
    D: CauseDetector + EffectDetector + ?Sized,
{
    let causes = scan_causes(input, detector);
    let dm_turns = scan_dm_turns(input, detector);
    debug!(
        causes = causes.len(),
        dm_turns = dm_turns.turns.len(),
        effects = dm_turns.effect_count(),
        "kernel: scanned transcript"
    );

    let allocated = allocate(input, &causes, &dm_turns, params, scorer);

    let mut links = allocated.links;
    let neighbor_edges = boost_link_masses(&mut links, params, tiers, scorer);

    debug!(
        links = links.len(),
        claimed = links.iter().filter(|l| l.claimed).count(),
        unclaimed_effects = allocated.unclaimed_effects.len(),
        edges = neighbor_edges.len(),
        "kernel: allocation complete"
    );

    KernelOutput {
        links,
        allocation: allocated.traces,
        unclaimed_effects: allocated.unclaimed_effects,
        neighbor_edges,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use session_model::{CauseDetector, Detection, EffectDetector};

    /// Detector that classifies lines by exact text.
    #[derive(Debug, Default)]
    pub struct ScriptedDetector {
        causes: BTreeMap<String, Detection>,
        effects: BTreeMap<String, Detection>,
    }

    impl ScriptedDetector {
        pub fn cause(mut self, text: &str, mass: f64) -> Self {
            self.causes.insert(text.to_string(), Detection::new("action", mass));
            self
        }

        pub fn effect(mut self, text: &str, mass: f64) -> Self {
            self.effects.insert(text.to_string(), Detection::new("narration", mass));
            self
        }
    }

    impl CauseDetector for ScriptedDetector {
        fn detect_cause(&self, text: &str) -> Option<Detection> {
            self.causes.get(text).cloned()
        }
    }

    impl EffectDetector for ScriptedDetector {
        fn detect_effect(&self, text: &str) -> Option<Detection> {
            self.effects.get(text).cloned()
        }

        fn is_answer(&self, text: &str) -> bool {
            text.starts_with("Yes") || text.starts_with("No")
        }
    }
}
