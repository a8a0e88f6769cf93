// src/pipeline/stage.rs

//! Artifact contracts of the two external stages.
//!
//! Each stage writes its files next to its input, named `<input base>.<suffix>`.
//! The runner then moves them under the stage's own content-addressed base.

use std::path::Path;

use tracing::debug;

use crate::descriptor::with_suffix;
use crate::errors::{CacheError, Result};
use crate::fs::{copy_atomic, FileSystem};
use crate::types::StageKind;

/// Which files a stage produces and which it carries forward.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub kind: StageKind,
    /// Must all exist after a successful run, otherwise the stage fails.
    pub required: &'static [&'static str],
    /// Moved only when present.
    pub optional: &'static [&'static str],
    /// Copied from the stage input so consumers only look in one place.
    pub forwarded: &'static [&'static str],
}

pub const EXTRACT_STAGE: StageSpec = StageSpec {
    kind: StageKind::Extract,
    required: &[
        "core",
        "names",
        "restrictions",
        "ebg",
        "enw",
        "edges",
        "fileIndex",
        "geometry",
        "nodes",
        "ramIndex",
        "properties",
        "icd",
    ],
    optional: &["edge_segment_lookup", "edge_penalties"],
    forwarded: &[],
};

pub const CONTRACT_STAGE: StageSpec = StageSpec {
    kind: StageKind::Contract,
    required: &[
        "hsgr",
        "fileIndex",
        "geometry",
        "nodes",
        "ramIndex",
        "core",
        "edges",
        "datasource_indexes",
        "datasource_names",
        "level",
        "icd",
    ],
    optional: &[],
    forwarded: &["names", "restrictions", "properties", "core"],
};

impl StageSpec {
    /// Suffixes this stage owns at its output base.
    pub fn owns(&self, suffix: &str) -> bool {
        self.required.contains(&suffix) || self.optional.contains(&suffix)
    }

    /// Required and forwarded suffixes missing under `base`.
    pub fn missing(&self, fs: &dyn FileSystem, base: &Path) -> Vec<&'static str> {
        self.required
            .iter()
            .chain(self.forwarded.iter())
            .copied()
            .filter(|suffix| !fs.exists(&with_suffix(base, suffix)))
            .collect()
    }

    /// Whether every required and forwarded file exists under `base`.
    pub fn is_complete(&self, fs: &dyn FileSystem, base: &Path) -> bool {
        self.missing(fs, base).is_empty()
    }

    /// Move this stage's freshly produced files from `from` to `to`.
    ///
    /// All required files are checked before anything is moved, so a stage
    /// with a missing output fails without leaving half a result behind.
    /// Suffixes for which `shared` returns true are copied instead of
    /// renamed: the files at `from` belong to an upstream cache entry that
    /// other scenarios may still need.
    pub fn collect_outputs(
        &self,
        fs: &dyn FileSystem,
        from: &Path,
        to: &Path,
        shared: impl Fn(&str) -> bool,
    ) -> Result<()> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .copied()
            .filter(|suffix| !fs.exists(&with_suffix(from, suffix)))
            .collect();
        if !missing.is_empty() {
            return Err(CacheError::FileError {
                path: from.to_path_buf(),
                reason: format!(
                    "{} exited successfully but did not produce: {}",
                    self.kind,
                    missing.join(", ")
                ),
            });
        }

        let present_optional = self
            .optional
            .iter()
            .copied()
            .filter(|suffix| fs.exists(&with_suffix(from, suffix)));

        for suffix in self.required.iter().copied().chain(present_optional) {
            let src = with_suffix(from, suffix);
            let dst = with_suffix(to, suffix);
            if shared(suffix) {
                debug!(stage = %self.kind, ?src, ?dst, "copying shared output");
                copy_atomic(fs, &src, &dst).map_err(|e| CacheError::file(&dst, e))?;
            } else {
                debug!(stage = %self.kind, ?src, ?dst, "moving output");
                fs.rename(&src, &dst).map_err(|e| CacheError::file(&dst, e))?;
            }
        }

        for suffix in self.forwarded.iter().copied() {
            if self.required.contains(&suffix) {
                continue;
            }
            let src = with_suffix(from, suffix);
            let dst = with_suffix(to, suffix);
            debug!(stage = %self.kind, ?src, ?dst, "forwarding input");
            copy_atomic(fs, &src, &dst).map_err(|e| CacheError::file(&dst, e))?;
        }

        Ok(())
    }
}
