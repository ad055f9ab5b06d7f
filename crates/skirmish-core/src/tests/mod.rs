//! Crate-level tests that exercise several modules together.
//!
//! - `scenarios.rs`: worked examples of the rules, end to end
//! - `combat_flow.rs`: turn order, action economy and rejection rules
//! - `determinism.rs`: seeded sessions replay identically, snapshots resume
//! - `properties.rs`: proptest invariants
//! - `helpers.rs`: roster builders and tracing setup

mod combat_flow;
mod helpers;

pub use helpers::*;
