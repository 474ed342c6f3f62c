//! # Causal Hierarchy
//!
//! Turns a play-session transcript into a multi-level graph of cause/effect
//! links. Player lines that initiate something are paired with the DM lines
//! that resolve them, the resulting links trade mass with their neighbors, and
//! nearby links are composed into beats, events and scenes.
//!
//! ## Core Components
//!
//! - **kernel**: Leaf extraction with mass-ordered exclusive effect allocation
//! - **anneal**: Neighbor mass redistribution and tiering
//! - **compose**: Greedy link/link matching into the next hierarchy level
//! - **absorb**: Attaches leftover fragments to links as context
//! - **orchestrator**: Runs the rounds and records metrics and provenance
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: Every ordering has a total tie-break; identical input gives byte-identical output
//! - **Pure**: No I/O and no clock; timestamps come from the caller
//! - **Soft schema**: Derived node fields are read through `resolve_*` fallbacks

pub mod absorb;
pub mod anneal;
pub mod compose;
pub mod config;
pub mod error;
pub mod evidence;
pub mod kernel;
pub mod lexical;
pub mod model;
pub mod orchestrator;

pub use absorb::*;
pub use anneal::*;
pub use compose::*;
pub use config::*;
pub use error::*;
pub use evidence::*;
pub use kernel::*;
pub use lexical::*;
pub use model::*;
pub use orchestrator::*;
