// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external pipeline
//! executables, using `tokio::process::Command`.
//!
//! - [`process`] spawns one child, drains both pipes and waits for it.
//! - [`backend`] provides the `ProcessExecutor` trait and the concrete
//!   `RealProcessExecutor` the pipeline uses in production, and which tests
//!   can replace with a fake implementation.

pub mod backend;
pub mod process;

pub use backend::{Invocation, ProcessExecutor, ProcessOutput, RealProcessExecutor};
pub use process::run_process;
