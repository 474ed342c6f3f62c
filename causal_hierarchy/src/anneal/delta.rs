//! Per-link mass delta trace and its TSV rendering for audit tooling.

use serde::{Deserialize, Serialize};

use crate::model::Tier;

/// Column header of the mass-delta TSV.
pub const MASS_DELTA_TSV_HEADER: &str =
    "link_id\tmass_base\tmass_prev\tmass_new\tboost\ttier_prev\ttier_new\ttop_contributor_link_id";

/// How one node's mass changed during an anneal phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassDelta {
    pub link_id: String,
    pub mass_base: f64,
    pub mass_prev: f64,
    pub mass_new: f64,
    pub boost: f64,
    pub tier_prev: Tier,
    pub tier_new: Tier,
    /// Neighbor with the largest contribution, if any.
    pub top_contributor_id: Option<String>,
}

impl MassDelta {
    /// Render as one TSV row (no trailing newline).
    pub fn to_tsv_row(&self) -> String {
        format!(
            "{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{}\t{}\t{}",
            self.link_id,
            self.mass_base,
            self.mass_prev,
            self.mass_new,
            self.boost,
            self.tier_prev,
            self.tier_new,
            self.top_contributor_id.as_deref().unwrap_or(""),
        )
    }
}

/// Render deltas as a TSV document with header, one row per delta.
pub fn render_mass_delta_tsv(deltas: &[MassDelta]) -> String {
    let mut out = String::from(MASS_DELTA_TSV_HEADER);
    out.push('\n');
    for delta in deltas {
        out.push_str(&delta.to_tsv_row());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> MassDelta {
        MassDelta {
            link_id: "a".to_string(),
            mass_base: 2.0,
            mass_prev: 2.1,
            mass_new: 2.6,
            boost: 0.6,
            tier_prev: Tier::Link,
            tier_new: Tier::Beat,
            top_contributor_id: Some("b".to_string()),
        }
    }

    #[test]
    fn test_row_format() {
        assert_eq!(
            delta().to_tsv_row(),
            "a\t2.000000\t2.100000\t2.600000\t0.600000\tlink\tbeat\tb"
        );
    }

    #[test]
    fn test_missing_contributor_is_empty_column() {
        let mut d = delta();
        d.top_contributor_id = None;
        assert!(d.to_tsv_row().ends_with("\tbeat\t"));
    }

    #[test]
    fn test_document() {
        let tsv = render_mass_delta_tsv(&[delta(), delta()]);
        let lines: Vec<_> = tsv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], MASS_DELTA_TSV_HEADER);
        assert_eq!(lines[0].split('\t').count(), 8);
        assert_eq!(lines[1].split('\t').count(), 8);
    }
}
