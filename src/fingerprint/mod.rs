// src/fingerprint/mod.rs

//! Fingerprints: the cache-invalidation keys of the pipeline.
//!
//! The chain is strictly layered:
//!
//! ```text
//! binary ── profile (+ library scripts) ── extract (+ args) ── contract (+ args)
//! ```
//!
//! Changing a link changes every link to its right and nothing to its left.

pub mod computer;
pub mod hash;

pub use computer::{library_scripts, FingerprintComputer, FingerprintInputs, Fingerprints};
pub use hash::{hash_files, hash_string, update_fingerprint, update_with_args, Fingerprint};
