//! Soft-schema resolution.
//!
//! Nodes loaded from older rows may miss any derived field. Every phase reads
//! derived values through these functions so the precedence rules live in one
//! place. Non-finite values count as missing.

use super::CausalLink;

fn first_finite(candidates: &[Option<f64>]) -> Option<f64> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| value.is_finite())
}

/// Current mass: `mass ?? link_mass ?? mass_base ?? cause_mass ?? 0`.
pub fn resolve_mass(node: &CausalLink) -> f64 {
    first_finite(&[node.mass, node.link_mass, node.mass_base, node.cause_mass]).unwrap_or(0.0)
}

/// Intrinsic mass: `mass_base ?? mass ?? link_mass ?? cause_mass ?? 0`.
pub fn resolve_base_mass(node: &CausalLink) -> f64 {
    first_finite(&[node.mass_base, node.mass, node.link_mass, node.cause_mass]).unwrap_or(0.0)
}

/// Center: `center_index ?? midpoint(cause, effect) ?? cause`.
pub fn resolve_center(node: &CausalLink) -> f64 {
    if let Some(center) = node.center_index.filter(|c| c.is_finite()) {
        return center;
    }
    match node.effect_anchor_index {
        Some(effect) => (node.cause_anchor_index + effect) as f64 / 2.0,
        None => node.cause_anchor_index as f64,
    }
}

/// Inclusive span, falling back to the cause/effect anchors.
pub fn resolve_span(node: &CausalLink) -> (usize, usize) {
    let cause = node.cause_anchor_index;
    let effect = node.effect_anchor_index.unwrap_or(cause);
    let start = node.span_start_index.unwrap_or(cause.min(effect));
    let end = node.span_end_index.unwrap_or(cause.max(effect));
    (start.min(end), start.max(end))
}

/// Internal strength: `strength_internal ?? strength_bridge ?? score ?? 0`.
pub fn resolve_strength_internal(node: &CausalLink) -> f64 {
    first_finite(&[node.strength_internal, node.strength_bridge, node.score]).unwrap_or(0.0)
}
