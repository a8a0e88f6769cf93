// src/pipeline/mod.rs

//! The extract → contract pipeline.
//!
//! - [`stage`] declares which files each external stage produces, which are
//!   optional and which are carried forward, and moves them between cache
//!   locations.
//! - [`runner`] owns the idempotent `reprocess` sequence and the failure
//!   classification of stage processes.

pub mod runner;
pub mod stage;

pub use runner::{
    PipelineReport, PipelineRunner, PipelineSettings, StageOptions, StageOutcome,
    DEFAULT_LOG_TAIL_LINES,
};
pub use stage::{StageSpec, CONTRACT_STAGE, EXTRACT_STAGE};
