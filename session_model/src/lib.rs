//! # Session Model
//!
//! The "Session Record" crate - everything the causal hierarchy engine consumes
//! from the outside world. This crate holds the input contract only and does not
//! contain any scoring or composition logic.
//!
//! ## Core Components
//!
//! - **transcript**: Timestamped dialogue lines of a play session
//! - **eligibility**: Line-level gate compiled by the chunk classifier (fail-closed)
//! - **actors**: Registered player characters and the DM speaker set
//! - **detectors**: Cause/effect classification oracle and a default pattern catalogue

pub mod actors;
pub mod detectors;
pub mod eligibility;
pub mod error;
pub mod transcript;

pub use actors::*;
pub use detectors::*;
pub use eligibility::*;
pub use error::*;
pub use transcript::*;
