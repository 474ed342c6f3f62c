//! Round orchestrator - runs the full hierarchy build for one session.
//!
//! Kernel → Anneal (round 1) → [Compose → Anneal → strength propagation] for
//! each further round up to `max_level`. Singleton absorption runs after every
//! round; unclaimed effects nobody took are offered again in the next one.

mod diagnostics;
mod metrics;
mod provenance;

pub use diagnostics::*;
pub use metrics::*;
pub use provenance::*;

use std::collections::{BTreeMap, BTreeSet};

use session_model::{
    ActorRegistry, CauseDetector, DmSpeakers, EffectDetector, EligibilityMask, TranscriptEntry,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::absorb::absorb_singletons;
use crate::anneal::{anneal, render_mass_delta_tsv, MassDelta};
use crate::compose::{compose, PairCandidate};
use crate::config::HierarchyParams;
use crate::error::HierarchyResult;
use crate::kernel::{extract_links, AllocationTrace, KernelInput};
use crate::lexical::LexicalScorer;
use crate::model::{
    resolve_strength_internal, CausalLink, ContextEdge, NeighborEdgeTrace, Phase, SingletonNode,
};

/// Everything supplied for one session.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyInput<'a> {
    pub session_id: &'a str,
    pub transcript: &'a [TranscriptEntry],
    pub mask: &'a EligibilityMask,
    pub actors: &'a ActorRegistry,
    pub dm_speakers: &'a DmSpeakers,
    /// Stamped on every node created during the run.
    pub created_at_ms: i64,
}

impl<'a> HierarchyInput<'a> {
    fn kernel_input(&self) -> KernelInput<'a> {
        KernelInput {
            session_id: self.session_id,
            transcript: self.transcript,
            mask: self.mask,
            actors: self.actors,
            dm_speakers: self.dm_speakers,
            created_at_ms: self.created_at_ms,
        }
    }
}

/// Node set and traces of one hierarchy round.
#[derive(Debug, Clone, Default)]
pub struct RoundOutput {
    pub round: u8,
    /// Annealed nodes, ordered by center then ID from round 2 on.
    pub nodes: Vec<CausalLink>,
    pub deltas: Vec<MassDelta>,
    /// Kernel boosting (round 1) and anneal contributions.
    pub neighbor_edges: Vec<NeighborEdgeTrace>,
    /// Accepted composer pairs; empty in round 1.
    pub pairs: Vec<PairCandidate>,
    pub context_edges: Vec<ContextEdge>,
    pub composites: usize,
    pub unpaired: usize,
}

impl RoundOutput {
    pub fn mass_delta_tsv(&self) -> String {
        render_mass_delta_tsv(&self.deltas)
    }
}

/// Full result of one run.
#[derive(Debug, Clone)]
pub struct HierarchyOutput {
    pub session_id: String,
    pub rounds: Vec<RoundOutput>,
    pub allocation: Vec<AllocationTrace>,
    /// Singletons still unattached after the last round.
    pub unattached: Vec<SingletonNode>,
    pub metrics: Vec<PhaseMetrics>,
    pub diagnostics: Vec<Diagnostic>,
    pub provenance: Provenance,
    /// SHA-256 over the serialized node sets of every round.
    pub output_hash: String,
}

impl HierarchyOutput {
    /// Nodes of the highest round built.
    pub fn final_nodes(&self) -> &[CausalLink] {
        self.rounds.last().map(|r| r.nodes.as_slice()).unwrap_or(&[])
    }

    pub fn round(&self, round: u8) -> Option<&RoundOutput> {
        self.rounds.iter().find(|r| r.round == round)
    }
}

/// SHA-256 over the JSON rendering of each round's nodes, in round order.
pub fn output_hash(rounds: &[RoundOutput]) -> HierarchyResult<String> {
    let mut hasher = Sha256::new();
    for round in rounds {
        hasher.update([round.round]);
        hasher.update(serde_json::to_vec(&round.nodes)?);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Add each new composite's children's internal strength to its bridge strength.
fn propagate_internal_strength(nodes: &mut [CausalLink], children: &[CausalLink]) {
    let by_id: BTreeMap<&str, &CausalLink> =
        children.iter().map(|c| (c.id.as_str(), c)).collect();

    for node in nodes.iter_mut() {
        if by_id.contains_key(node.id.as_str()) {
            continue;
        }
        let Some([left, right]) = node.members() else {
            continue;
        };
        let (Some(left), Some(right)) = (by_id.get(left.as_str()), by_id.get(right.as_str()))
        else {
            continue;
        };
        let bridge = node.strength_bridge.unwrap_or(0.0);
        node.strength_internal =
            Some(bridge + resolve_strength_internal(left) + resolve_strength_internal(right));
    }
}

/// Builds causal hierarchies with validated parameters and a cause/effect detector.
#[derive(Debug, Clone)]
pub struct HierarchyEngine<D> {
    params: HierarchyParams,
    detector: D,
    provenance: Provenance,
}

impl<D> HierarchyEngine<D>
where
    D: CauseDetector + EffectDetector,
{
    /// Validate `params` and fingerprint them; nothing runs on invalid input.
    pub fn new(params: HierarchyParams, detector: D) -> HierarchyResult<Self> {
        params.validate()?;
        let provenance = Provenance::from_params(&params)?;
        Ok(Self {
            params,
            detector,
            provenance,
        })
    }

    pub fn params(&self) -> &HierarchyParams {
        &self.params
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Run every round for one session.
    pub fn run(&self, input: &HierarchyInput<'_>) -> HierarchyResult<HierarchyOutput> {
        let params = &self.params;
        let diagnostics = check_input(input);

        let scorer = LexicalScorer::from_params(
            &params.lexical,
            input
                .transcript
                .iter()
                .filter(|entry| input.mask.is_eligible(entry.line_index))
                .map(|entry| entry.content.as_str()),
        );

        let kernel = extract_links(
            &input.kernel_input(),
            &params.kernel,
            &params.tiers,
            &scorer,
            &self.detector,
        );
        info!(
            session_id = input.session_id,
            links = kernel.links.len(),
            claimed = kernel.claimed_count(),
            unclaimed_effects = kernel.unclaimed_effects.len(),
            "Round 1: kernel extraction complete"
        );

        let mut metrics = vec![PhaseMetrics::from_nodes(1, Phase::Kernel, &kernel.links)];

        // Unclaimed causes stay structural; only unclaimed effects become context
        let mut singletons: Vec<SingletonNode> = kernel.unclaimed_effects.clone();

        let annealed = anneal(kernel.links, &params.anneal, &params.tiers, &scorer, 1);
        metrics.push(PhaseMetrics::from_nodes(1, Phase::Anneal, &annealed.nodes));

        let absorbed = absorb_singletons(&singletons, &annealed.nodes, &params.absorb, &scorer, 1);
        metrics.push(context_metrics(1, &absorbed.edges, &singletons));
        singletons = absorbed.unattached;

        let mut neighbor_edges = kernel.neighbor_edges;
        neighbor_edges.extend(annealed.edges);

        let mut rounds = vec![RoundOutput {
            round: 1,
            nodes: annealed.nodes,
            deltas: annealed.deltas,
            neighbor_edges,
            pairs: Vec::new(),
            context_edges: absorbed.edges,
            composites: 0,
            unpaired: 0,
        }];
        info!(
            round = 1,
            nodes = rounds[0].nodes.len(),
            attached = rounds[0].context_edges.len(),
            "Round 1: complete"
        );

        for round in 2..=params.max_level {
            let previous = &rounds[rounds.len() - 1].nodes;

            let composed = compose(
                previous,
                &params.link_links,
                &params.tiers,
                &scorer,
                input.created_at_ms,
            );
            metrics.push(PhaseMetrics::from_nodes(round, Phase::Compose, &composed.nodes));

            let mut annealed = anneal(composed.nodes, &params.anneal, &params.tiers, &scorer, round);
            propagate_internal_strength(&mut annealed.nodes, previous);
            metrics.push(PhaseMetrics::from_nodes(round, Phase::Anneal, &annealed.nodes));

            let absorbed =
                absorb_singletons(&singletons, &annealed.nodes, &params.absorb, &scorer, round);
            metrics.push(context_metrics(round, &absorbed.edges, &singletons));
            singletons = absorbed.unattached;

            info!(
                round,
                nodes = annealed.nodes.len(),
                composites = composed.composites,
                unpaired = composed.unpaired,
                attached = absorbed.edges.len(),
                "Round {round}: complete"
            );

            rounds.push(RoundOutput {
                round,
                nodes: annealed.nodes,
                deltas: annealed.deltas,
                neighbor_edges: annealed.edges,
                pairs: composed.accepted,
                context_edges: absorbed.edges,
                composites: composed.composites,
                unpaired: composed.unpaired,
            });
        }

        let output_hash = output_hash(&rounds)?;
        debug!(
            session_id = input.session_id,
            output_hash = %output_hash,
            param_hash = %self.provenance.param_hash,
            unattached = singletons.len(),
            "hierarchy build complete"
        );

        Ok(HierarchyOutput {
            session_id: input.session_id.to_string(),
            rounds,
            allocation: kernel.allocation,
            unattached: singletons,
            metrics,
            diagnostics,
            provenance: self.provenance.clone(),
            output_hash,
        })
    }
}

/// Absorption statistics: attached singleton mass and context strength.
fn context_metrics(round: u8, edges: &[ContextEdge], singletons: &[SingletonNode]) -> PhaseMetrics {
    let attached: BTreeSet<&str> = edges.iter().map(|e| e.singleton_id.as_str()).collect();
    PhaseMetrics {
        round,
        phase: Phase::Absorb,
        count: edges.len(),
        mass: Distribution::from_values(
            singletons
                .iter()
                .filter(|s| attached.contains(s.id.as_str()))
                .map(|s| s.mass),
        ),
        strength: Distribution::from_values(edges.iter().map(|e| e.strength_ctx)),
    }
}
