//! Evidence/strength model - pure math shared by every phase.
//!
//! Distance and lexical signals combine into a bounded evidence score in
//! [0, 1], which maps through an exponent and scale into an unbounded strength.
//! Merge decisions compare strength against a threshold that grows with the
//! mass of the nodes involved.

/// Weight of distance evidence in [`evidence`].
pub const DISTANCE_WEIGHT: f64 = 0.7;

/// Weight of lexical evidence in [`evidence`].
pub const LEXICAL_WEIGHT: f64 = 0.3;

/// Default scale of [`strength`].
pub const DEFAULT_STRENGTH_SCALE: f64 = 2.0;

/// Clamp to [0, 1]; NaN maps to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Combine distance and lexical evidence into a bounded score.
pub fn evidence(distance_evidence: f64, lexical_evidence: f64, boost: f64) -> f64 {
    clamp01(DISTANCE_WEIGHT * distance_evidence + LEXICAL_WEIGHT * lexical_evidence + boost)
}

/// Map evidence to strength: `scale * E^gamma` for positive evidence.
///
/// `gamma < 1` is forgiving, `gamma == 1` linear, `gamma > 1` strict.
pub fn strength(evidence: f64, gamma: f64, scale: f64) -> f64 {
    if evidence > 0.0 {
        scale * evidence.powf(gamma)
    } else {
        0.0
    }
}

/// Strength two nodes need to merge.
///
/// Heavier pairs need more evidence, which keeps already-large composites
/// from chaining without bound.
pub fn merge_threshold(mass_a: f64, mass_b: f64, t0: f64, eta: f64) -> f64 {
    let geometric = (mass_a.max(0.0) * mass_b.max(0.0)).sqrt();
    t0 + eta * geometric.ln_1p()
}

/// Saturating Hill decay: 1 at distance zero, `1 / (1 + (d/tau)^p)` beyond.
pub fn distance_score_hill(distance: f64, tau: f64, p: f64) -> f64 {
    if distance <= 0.0 {
        return 1.0;
    }
    1.0 / (1.0 + (distance / tau).powf(p))
}

/// Distance decay scaled by lexical agreement: `hill(d) * (1 + beta * lexical)`.
///
/// Used for cause/effect scoring, neighbor boosting, and context attachment.
pub fn hill_lexical_strength(distance: f64, tau: f64, p: f64, beta: f64, lexical: f64) -> f64 {
    distance_score_hill(distance, tau, p) * (1.0 + beta * lexical)
}

/// Map the locality knob in [0, 1] to a decay half-life in [4, 8].
pub fn locality_to_tau(locality: f64) -> f64 {
    4.0 + 4.0 * (1.0 - clamp01(locality))
}
