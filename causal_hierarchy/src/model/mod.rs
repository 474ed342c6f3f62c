//! Data model - the single node type shared by every hierarchy level, plus
//! the provenance records emitted alongside it.
//!
//! - **link**: `CausalLink` nodes, their kind and tier
//! - **resolve**: the soft-schema fallback chains for partially populated nodes
//! - **trace**: neighbor edges, context edges, and singleton fragments

mod link;
mod resolve;
mod trace;

pub use link::*;
pub use resolve::*;
pub use trace::*;
