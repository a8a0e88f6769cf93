// src/scenario/cache.rs

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{CacheError, Result};
use crate::fingerprint::{hash_string, Fingerprint};
use crate::fs::FileSystem;

use super::naming::{name_for, relative_str};

/// Derives per-specification cache directories.
///
/// Layout: `<cache_root>/<spec path relative to features_root>/<hash>/`,
/// where `<hash>` covers the binary+profile fingerprint and the full text
/// of the specification document.
#[derive(Debug, Clone)]
pub struct ScenarioCache {
    fs: Arc<dyn FileSystem>,
    cache_root: PathBuf,
    features_root: PathBuf,
    fingerprint: Fingerprint,
}

/// Cache directory of one specification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioCacheEntry {
    pub feature_cache_directory: PathBuf,
    pub feature_hash: Fingerprint,
}

/// Base name of one scenario inside its feature directory, plus the
/// artifact names derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioFiles {
    pub scenario_base_name: PathBuf,
}

impl ScenarioCache {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cache_root: impl Into<PathBuf>,
        features_root: impl Into<PathBuf>,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            fs,
            cache_root: cache_root.into(),
            features_root: features_root.into(),
            fingerprint,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// `<cache_root>/<relative spec path>`, the parent of every hash
    /// directory of this document.
    pub fn feature_root(&self, spec_path: &Path) -> PathBuf {
        let relative = relative_str(self.fs.as_ref(), &self.features_root, spec_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| without_root(spec_path));
        self.cache_root.join(relative)
    }

    /// Entry for `spec_path`; the directory is created before returning.
    pub fn for_scenario(&self, spec_path: &Path, spec_content: &str) -> Result<ScenarioCacheEntry> {
        let feature_hash = hash_string(&format!("{}{}", self.fingerprint, spec_content));
        let feature_cache_directory = self.feature_root(spec_path).join(feature_hash.as_str());

        self.fs
            .create_dir_all(&feature_cache_directory)
            .map_err(|e| CacheError::file(&feature_cache_directory, e))?;
        debug!(dir = ?feature_cache_directory, "feature cache directory ready");

        Ok(ScenarioCacheEntry {
            feature_cache_directory,
            feature_hash,
        })
    }

    /// Remove hash directories next to `entry` that belong to older versions
    /// of the document or older fingerprints. Returns how many were removed.
    ///
    /// Never called implicitly; cache entries live for the whole run.
    pub fn cleanup_stale(&self, entry: &ScenarioCacheEntry) -> Result<usize> {
        let Some(parent) = entry.feature_cache_directory.parent() else {
            return Ok(0);
        };

        let siblings = self.fs.read_dir(parent).map_err(|e| CacheError::file(parent, e))?;
        let mut removed = 0;
        for sibling in siblings {
            if sibling == entry.feature_cache_directory || !self.fs.is_dir(&sibling) {
                continue;
            }
            self.fs
                .remove_dir_all(&sibling)
                .map_err(|e| CacheError::file(&sibling, e))?;
            removed += 1;
        }

        if removed > 0 {
            info!(dir = ?parent, removed, "removed stale feature caches");
        }
        Ok(removed)
    }
}

impl ScenarioCacheEntry {
    pub fn scenario(&self, title: &str, line: u32) -> ScenarioFiles {
        ScenarioFiles {
            scenario_base_name: self.feature_cache_directory.join(name_for(title, line)),
        }
    }
}

impl ScenarioFiles {
    fn with_tail(&self, tail: &str) -> PathBuf {
        let mut s = self.scenario_base_name.as_os_str().to_owned();
        s.push(tail);
        PathBuf::from(s)
    }

    /// `<scenario>.osm`: the generated map data, kept for debugging.
    pub fn osm_file(&self) -> PathBuf {
        self.with_tail(".osm")
    }

    pub fn raster_file(&self) -> PathBuf {
        self.with_tail("_raster.asc")
    }

    pub fn speeds_file(&self) -> PathBuf {
        self.with_tail("_speeds.csv")
    }

    pub fn penalties_file(&self) -> PathBuf {
        self.with_tail("_penalties.csv")
    }

    pub fn profile_file(&self) -> PathBuf {
        self.with_tail("_profile.lua")
    }
}

/// `path` with any root/prefix/`..` components dropped, so it can be
/// joined under the cache root.
fn without_root(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
