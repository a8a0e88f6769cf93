// src/fingerprint/computer.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobMatcher};
use tracing::{debug, info};

use crate::errors::{CacheError, Result};
use crate::fs::FileSystem;

use super::hash::{hash_files, update_fingerprint, update_with_args, Fingerprint};

/// Everything the fingerprint chain is derived from.
#[derive(Debug, Clone)]
pub struct FingerprintInputs {
    /// Executables and shared libraries, in hashing order.
    pub binaries: Vec<PathBuf>,
    pub profile: PathBuf,
    /// Library scripts the profile may load, in hashing order.
    pub library_scripts: Vec<PathBuf>,
    pub extract_args: Vec<String>,
    pub contract_args: Vec<String>,
}

/// Immutable copy of the current fingerprint chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprints {
    /// Executables + shared libraries.
    pub binary: Fingerprint,
    /// `binary` plus the profile and its library scripts.
    pub profile: Fingerprint,
    /// `profile` plus the extraction arguments.
    pub extract: Fingerprint,
    /// `extract` plus the contraction arguments.
    pub contract: Fingerprint,
}

/// Session-wide owner of the fingerprint chain.
///
/// Binaries are hashed once at construction. The setters recompute only the
/// links downstream of what changed: a new profile rehashes the profile and
/// everything after it, new contraction args only touch `contract`.
#[derive(Debug)]
pub struct FingerprintComputer {
    fs: Arc<dyn FileSystem>,
    extract_args: Vec<String>,
    contract_args: Vec<String>,
    current: Fingerprints,
}

impl FingerprintComputer {
    pub fn new(fs: Arc<dyn FileSystem>, inputs: &FingerprintInputs) -> Result<Self> {
        let binary = hash_files(fs.as_ref(), &inputs.binaries)?;
        info!(binary = %binary, count = inputs.binaries.len(), "hashed pipeline binaries");

        let profile = profile_fingerprint(fs.as_ref(), &binary, &inputs.profile, &inputs.library_scripts)?;
        let extract = update_with_args(&profile, &inputs.extract_args);
        let contract = update_with_args(&extract, &inputs.contract_args);

        Ok(Self {
            fs,
            extract_args: inputs.extract_args.clone(),
            contract_args: inputs.contract_args.clone(),
            current: Fingerprints {
                binary,
                profile,
                extract,
                contract,
            },
        })
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        &self.current
    }

    pub fn snapshot(&self) -> Fingerprints {
        self.current.clone()
    }

    /// Switch the active profile; invalidates extract and contract.
    pub fn set_profile(&mut self, profile: &Path, library_scripts: &[PathBuf]) -> Result<()> {
        let profile_fp =
            profile_fingerprint(self.fs.as_ref(), &self.current.binary, profile, library_scripts)?;
        if profile_fp != self.current.profile {
            debug!(profile = ?profile, fingerprint = %profile_fp, "profile fingerprint changed");
        }
        self.current.profile = profile_fp;
        self.refresh_extract();
        Ok(())
    }

    /// Replace the extraction args; invalidates extract and contract.
    pub fn set_extract_args(&mut self, args: Vec<String>) {
        self.extract_args = args;
        self.refresh_extract();
    }

    /// Replace the contraction args; only `contract` changes.
    pub fn set_contract_args(&mut self, args: Vec<String>) {
        self.contract_args = args;
        self.refresh_contract();
    }

    fn refresh_extract(&mut self) {
        self.current.extract = update_with_args(&self.current.profile, &self.extract_args);
        self.refresh_contract();
    }

    fn refresh_contract(&mut self) {
        self.current.contract = update_with_args(&self.current.extract, &self.contract_args);
    }
}

fn profile_fingerprint(
    fs: &dyn FileSystem,
    binary: &Fingerprint,
    profile: &Path,
    library_scripts: &[PathBuf],
) -> Result<Fingerprint> {
    let content = hash_files(
        fs,
        std::iter::once(profile).chain(library_scripts.iter().map(PathBuf::as_path)),
    )?;
    Ok(update_fingerprint(binary, content.as_str()))
}

/// List the library scripts under a profile directory.
///
/// Looks at `dir` and `dir/lib`, keeping files whose name matches `pattern`
/// (e.g. `"*.lua"`). Each listing is sorted so directory enumeration order
/// never reaches the hash. A missing `dir` is an error, a missing `lib` is
/// not.
pub fn library_scripts(fs: &dyn FileSystem, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|e| CacheError::ConfigError(format!("invalid library script pattern {pattern:?}: {e}")))?
        .compile_matcher();

    let mut scripts = list_matching(fs, dir, &matcher)?;
    let lib = dir.join("lib");
    if fs.is_dir(&lib) {
        scripts.extend(list_matching(fs, &lib, &matcher)?);
    }
    Ok(scripts)
}

fn list_matching(fs: &dyn FileSystem, dir: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    let entries = fs.read_dir(dir).map_err(|err| CacheError::HashError {
        path: dir.to_path_buf(),
        reason: format!("{err:#}"),
    })?;

    let mut matching: Vec<PathBuf> = entries
        .into_iter()
        .filter(|p| fs.is_file(p))
        .filter(|p| p.file_name().is_some_and(|name| matcher.is_match(name)))
        .collect();
    matching.sort();
    Ok(matching)
}
