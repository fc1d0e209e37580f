//! Pure device logic for H2Real.
//!
//! This crate holds every calculation that does not need a live vehicle:
//! graph walks, reservoir selection, oxidizer depletion, the enable state
//! machine and the per-device heat balance. Functions take plain data (or a
//! small trait describing the host) and return results, so the whole crate is
//! unit-testable without an ECS world or a thermal engine.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Tunable constants, TOML load/save, version-gated migration |
//! | [`connectivity`] | Worklist traversal of the mechanical joint graph |
//! | [`constants`] | Stoichiometry, unit conversions, resource subtypes |
//! | [`depletion`] | Greedy multi-reservoir oxidizer depletion |
//! | [`enable_state`] | Operator intent vs. actual enabled state, reentrancy guard |
//! | [`energy`] | Combustion, thrust and melting/compression energy balance |
//! | [`info`] | Custom-info text for the host's detail panel |
//! | [`locator`] | Reachable reservoir discovery and fill aggregation |

pub mod config;
pub mod connectivity;
pub mod constants;
pub mod depletion;
pub mod enable_state;
pub mod energy;
pub mod info;
pub mod locator;
