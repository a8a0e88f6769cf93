// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// data_dir = "test/data"
/// cache_dir = "test/cache"
///
/// [binaries]
/// extract = "build/osrm-extract"
/// contract = "build/osrm-contract"
/// server = "build/osrm-routed"
/// libraries = ["build/libosrm.so"]
///
/// [pipeline]
/// profile = "bicycle"
/// extract_args = ["--threads", "1"]
///
/// [server]
/// address = "127.0.0.1:5000"
/// ```
///
/// Only `[binaries]` is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    pub binaries: BinariesSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub server: ServerSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub binaries: BinariesSection,
    pub pipeline: PipelineSection,
    pub server: ServerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        binaries: BinariesSection,
        pipeline: PipelineSection,
        server: ServerSection,
    ) -> Self {
        Self {
            paths,
            binaries,
            pipeline,
            server,
        }
    }

    /// Path of the active profile script.
    ///
    /// A bare name like `"car"` resolves to `<profiles_dir>/car.lua`; anything
    /// with an extension is taken relative to `profiles_dir` as is.
    pub fn profile_path(&self) -> PathBuf {
        let profile = Path::new(&self.pipeline.profile);
        if profile.extension().is_some() {
            self.paths.profiles_dir.join(profile)
        } else {
            self.paths
                .profiles_dir
                .join(format!("{}.lua", self.pipeline.profile))
        }
    }

    /// Environment injected into every stage process.
    pub fn stage_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(ref path) = self.pipeline.library_path {
            let var = self
                .pipeline
                .library_path_var
                .clone()
                .unwrap_or_else(|| default_library_path_var().to_string());
            env.insert(var, path.to_string_lossy().into_owned());
        }
        env
    }
}

fn default_library_path_var() -> &'static str {
    if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Flat directory holding raw, extracted and contracted artifacts.
    /// Also the working directory of the stage processes.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root of the per-specification scenario caches.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Specification documents live under here; their path relative to it
    /// names their cache directory.
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,

    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("test/data")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("test/cache")
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("features")
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            features_dir: default_features_dir(),
            profiles_dir: default_profiles_dir(),
        }
    }
}

/// `[binaries]` section.
///
/// Every file listed here is hashed into the binary fingerprint, in this
/// order: extract, contract, server, then `libraries` as listed.
#[derive(Debug, Clone, Deserialize)]
pub struct BinariesSection {
    pub extract: PathBuf,
    pub contract: PathBuf,

    /// Not run by the pipeline, but data built by one server version is not
    /// trusted with another.
    #[serde(default)]
    pub server: Option<PathBuf>,

    /// Shared libraries loaded by the binaries.
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
}

impl BinariesSection {
    pub fn fingerprinted(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.extract.clone(), self.contract.clone()];
        paths.extend(self.server.iter().cloned());
        paths.extend(self.libraries.iter().cloned());
        paths
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default)]
    pub extract_args: Vec<String>,

    #[serde(default)]
    pub contract_args: Vec<String>,

    /// Extension of the raw input file, without the dot.
    #[serde(default = "default_input_extension")]
    pub input_extension: String,

    /// File-name glob for profile library scripts (in `profiles_dir` and
    /// `profiles_dir/lib`).
    #[serde(default = "default_library_script_pattern")]
    pub library_script_pattern: String,

    /// Shared-library search path for the stage processes.
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    /// Variable `library_path` is exported as; defaults to the platform's
    /// loader variable.
    #[serde(default)]
    pub library_path_var: Option<String>,

    /// Rerun every stage even when outputs exist.
    #[serde(default)]
    pub force: bool,

    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

fn default_profile() -> String {
    "bicycle".to_string()
}

fn default_input_extension() -> String {
    "osm".to_string()
}

fn default_library_script_pattern() -> String {
    "*.lua".to_string()
}

fn default_log_tail_lines() -> usize {
    crate::pipeline::DEFAULT_LOG_TAIL_LINES
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            extract_args: Vec::new(),
            contract_args: Vec::new(),
            input_extension: default_input_extension(),
            library_script_pattern: default_library_script_pattern(),
            library_path: None,
            library_path_var: None,
            force: false,
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Where a routing server would listen. When set, the session refuses
    /// to start if something already answers there.
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    200
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: None,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}
