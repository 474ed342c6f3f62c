//! Parameter validation, run before any computation.

use super::{DecayParams, HierarchyParams, StrengthModel, MAX_SUPPORTED_LEVEL};
use crate::error::{HierarchyError, HierarchyResult};

fn finite(name: &str, value: f64) -> HierarchyResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HierarchyError::invalid(name, format!("must be finite, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> HierarchyResult<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(HierarchyError::invalid(name, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> HierarchyResult<()> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(HierarchyError::invalid(name, format!("must be > 0, got {value}")));
    }
    Ok(())
}

fn at_least_one(name: &str, value: usize) -> HierarchyResult<()> {
    if value == 0 {
        return Err(HierarchyError::invalid(name, "must be >= 1"));
    }
    Ok(())
}

fn decay(prefix: &str, params: &DecayParams) -> HierarchyResult<()> {
    finite(&format!("{prefix}.decay.locality"), params.locality)?;
    if !(0.0..=1.0).contains(&params.locality) {
        return Err(HierarchyError::invalid(
            &format!("{prefix}.decay.locality"),
            format!("must be in [0, 1], got {}", params.locality),
        ));
    }
    if let Some(tau) = params.tau {
        positive(&format!("{prefix}.decay.tau"), tau)?;
    }
    positive(&format!("{prefix}.decay.p"), params.p)
}

impl HierarchyParams {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> HierarchyResult<()> {
        if !(1..=MAX_SUPPORTED_LEVEL).contains(&self.max_level) {
            return Err(HierarchyError::InvalidMaxLevel {
                max_level: self.max_level,
            });
        }

        let tiers = &self.tiers;
        non_negative("tiers.beat", tiers.beat)?;
        finite("tiers.event", tiers.event)?;
        finite("tiers.scene", tiers.scene)?;
        if !(tiers.beat < tiers.event && tiers.event < tiers.scene) {
            return Err(HierarchyError::invalid(
                "tiers",
                "thresholds must satisfy beat < event < scene",
            ));
        }

        let kernel = &self.kernel;
        at_least_one("kernel.k_local", kernel.k_local)?;
        decay("kernel", &kernel.decay)?;
        non_negative("kernel.beta_lex", kernel.beta_lex)?;
        non_negative("kernel.answer_boost", kernel.answer_boost)?;
        finite("kernel.strong_mass", kernel.strong_mass)?;
        finite("kernel.strong_min_score", kernel.strong_min_score)?;
        finite("kernel.weak_min_score", kernel.weak_min_score)?;
        if let Some(min_score) = kernel.min_score_override {
            finite("kernel.min_score_override", min_score)?;
        }
        non_negative("kernel.link_window", kernel.link_window)?;
        non_negative("kernel.beta_lex_ll", kernel.beta_lex_ll)?;
        non_negative("kernel.damping", kernel.damping)?;

        let anneal = &self.anneal;
        non_negative("anneal.window_links", anneal.window_links)?;
        at_least_one("anneal.top_k_contrib", anneal.top_k_contrib)?;
        non_negative("anneal.lambda", anneal.lambda)?;
        at_least_one("anneal.iterations", anneal.iterations)?;
        decay("anneal", &anneal.decay)?;
        non_negative("anneal.beta_lex_ll", anneal.beta_lex_ll)?;
        if let StrengthModel::Levers { gamma, scale } = anneal.strength_model {
            positive("anneal.strength_model.gamma", gamma)?;
            positive("anneal.strength_model.scale", scale)?;
        }

        let links = &self.link_links;
        at_least_one("link_links.k_local_links", links.k_local_links)?;
        non_negative("link_links.max_forward_lines", links.max_forward_lines)?;
        decay("link_links", &links.decay)?;
        positive("link_links.gamma", links.gamma)?;
        positive("link_links.scale", links.scale)?;
        finite("link_links.t0", links.t0)?;
        non_negative("link_links.eta", links.eta)?;
        non_negative("link_links.same_actor_boost", links.same_actor_boost)?;

        let absorb = &self.absorb;
        non_negative("absorb.radius_base", absorb.radius_base)?;
        non_negative("absorb.radius_per_mass", absorb.radius_per_mass)?;
        decay("absorb", &absorb.decay)?;
        non_negative("absorb.beta_lex", absorb.beta_lex)?;
        finite("absorb.min_ctx_strength", absorb.min_ctx_strength)?;
        non_negative("absorb.cap_base", absorb.cap_base)?;
        non_negative("absorb.cap_per_mass", absorb.cap_per_mass)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(HierarchyParams::default().validate().is_ok());
    }

    #[test]
    fn test_max_level_out_of_range() {
        for max_level in [0, 4, 9] {
            let params = HierarchyParams {
                max_level,
                ..HierarchyParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(HierarchyError::InvalidMaxLevel { max_level: m }) if m == max_level
            ));
        }
    }

    #[test]
    fn test_tier_order_enforced() {
        let mut params = HierarchyParams::default();
        params.tiers.event = params.tiers.scene;
        assert!(matches!(
            params.validate(),
            Err(HierarchyError::InvalidParam { ref name, .. }) if name == "tiers"
        ));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut params = HierarchyParams::default();
        params.anneal.top_k_contrib = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let mut params = HierarchyParams::default();
        params.link_links.t0 = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(HierarchyError::InvalidParam { ref name, .. }) if name == "link_links.t0"
        ));
    }

    #[test]
    fn test_locality_range() {
        let mut params = HierarchyParams::default();
        params.kernel.decay.locality = 1.5;
        assert!(params.validate().is_err());
    }
}
