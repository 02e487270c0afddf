//! The seed-selection engine.
//!
//! This module provides:
//! - **errors**: error type shared by every operation
//! - **graph** / **adjacency_index**: the immutable influence graph and its offset indexes
//! - **diffusion**: IC, LT and SI trials over sampled worlds
//! - **spread**: Monte Carlo spread estimation and the [`spread::SpreadOracle`] seam
//! - **greedy** / **celf**: oracle-driven selectors (plain greedy, CELF, CELF++)
//! - **rr_sets** / **ris** / **imm**: sketch-driven selectors over reverse-reachable sets
//! - **imrank**: ranking-based selector (IMRank with last-to-first allocation)
//! - **selection**: configuration, dispatch and degenerate-input handling
//! - **deadline**: per-call wall-clock limit

pub mod adjacency_index;
pub mod celf;
pub mod deadline;
pub mod diffusion;
pub mod errors;
pub mod graph;
pub mod greedy;
pub mod imm;
pub mod imrank;
pub mod ris;
pub mod rr_sets;
pub mod selection;
pub mod spread;
