// src/scenario/mod.rs

//! Scenario-scoped cache directories for debugging artifacts.
//!
//! Independent of the pipeline: these directories hold what a scenario
//! wants to keep around (generated map data, custom profiles, speed files),
//! keyed by the binary+profile fingerprint and the specification document
//! that owns the scenario.

pub mod cache;
pub mod naming;

pub use cache::{ScenarioCache, ScenarioCacheEntry, ScenarioFiles};
pub use naming::{name_for, MAX_TITLE_CHARS};
