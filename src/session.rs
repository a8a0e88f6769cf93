// src/session.rs

//! Session start-up and the session-wide fingerprint state.
//!
//! Everything that happens here is fatal on failure: if a binary cannot be
//! hashed or a stale server is running, no cache path can be trusted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ConfigFile;
use crate::context::{Loader, ScenarioContext};
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::fingerprint::{library_scripts, FingerprintComputer, FingerprintInputs, Fingerprints};
use crate::fs::FileSystem;
use crate::guard::ensure_no_server;
use crate::pipeline::{PipelineRunner, PipelineSettings, StageOptions};
use crate::scenario::ScenarioCache;

#[derive(Debug)]
pub struct Session {
    config: ConfigFile,
    fs: Arc<dyn FileSystem>,
    computer: FingerprintComputer,
}

impl Session {
    /// Check for a running server, then hash binaries and profile.
    pub async fn start(mut config: ConfigFile, fs: Arc<dyn FileSystem>) -> Result<Self> {
        if let Some(ref address) = config.server.address {
            ensure_no_server(address, Duration::from_millis(config.server.probe_timeout_ms)).await?;
        }

        // Stage processes run with the data root as their working
        // directory, so every path they receive must be absolute.
        let paths = &mut config.paths;
        paths.data_dir = absolute(&paths.data_dir)?;
        paths.cache_dir = absolute(&paths.cache_dir)?;
        paths.features_dir = absolute(&paths.features_dir)?;
        paths.profiles_dir = absolute(&paths.profiles_dir)?;

        let binaries = &mut config.binaries;
        binaries.extract = absolute(&binaries.extract)?;
        binaries.contract = absolute(&binaries.contract)?;
        binaries.server = binaries.server.as_deref().map(absolute).transpose()?;
        binaries.libraries = binaries
            .libraries
            .iter()
            .map(|lib| absolute(lib))
            .collect::<Result<_>>()?;

        config.pipeline.library_path = config.pipeline.library_path.as_deref().map(absolute).transpose()?;

        let inputs = FingerprintInputs {
            binaries: config.binaries.fingerprinted(),
            profile: config.profile_path(),
            library_scripts: library_scripts(
                fs.as_ref(),
                &config.paths.profiles_dir,
                &config.pipeline.library_script_pattern,
            )?,
            extract_args: config.pipeline.extract_args.clone(),
            contract_args: config.pipeline.contract_args.clone(),
        };
        let computer = FingerprintComputer::new(Arc::clone(&fs), &inputs)?;

        let fp = computer.fingerprints();
        info!(
            binary = %fp.binary,
            profile = %fp.profile,
            extract = %fp.extract,
            contract = %fp.contract,
            "session fingerprints ready"
        );

        Ok(Self {
            config,
            fs,
            computer,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        self.computer.fingerprints()
    }

    /// Switch to another profile (a name under `profiles_dir` or a file
    /// name with extension).
    pub fn set_profile(&mut self, profile: &str) -> Result<()> {
        self.config.pipeline.profile = profile.to_string();
        let scripts = library_scripts(
            self.fs.as_ref(),
            &self.config.paths.profiles_dir,
            &self.config.pipeline.library_script_pattern,
        )?;
        self.computer.set_profile(&self.config.profile_path(), &scripts)
    }

    pub fn set_extract_args(&mut self, args: Vec<String>) {
        self.config.pipeline.extract_args = args.clone();
        self.computer.set_extract_args(args);
    }

    pub fn set_contract_args(&mut self, args: Vec<String>) {
        self.config.pipeline.contract_args = args.clone();
        self.computer.set_contract_args(args);
    }

    /// Stage inputs matching the current fingerprints.
    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            profile: self.config.profile_path(),
            extract_args: self.config.pipeline.extract_args.clone(),
            contract_args: self.config.pipeline.contract_args.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            extract_bin: self.config.binaries.extract.clone(),
            contract_bin: self.config.binaries.contract.clone(),
            data_root: self.config.paths.data_dir.clone(),
            input_extension: self.config.pipeline.input_extension.clone(),
            env: self.config.stage_env(),
            force: self.config.pipeline.force,
            log_tail_lines: self.config.pipeline.log_tail_lines,
        }
    }

    pub fn scenario_cache(&self) -> ScenarioCache {
        ScenarioCache::new(
            Arc::clone(&self.fs),
            self.config.paths.cache_dir.clone(),
            self.config.paths.features_dir.clone(),
            self.fingerprints().profile.clone(),
        )
    }

    /// Build a context for the current fingerprint state.
    ///
    /// Contexts are snapshots: build a new one after changing the profile
    /// or stage args.
    pub fn context<E: ProcessExecutor>(&self, executor: E, loader: Arc<dyn Loader>) -> ScenarioContext<E> {
        let runner = PipelineRunner::new(Arc::clone(&self.fs), executor, self.pipeline_settings());
        ScenarioContext::new(
            Arc::clone(&self.fs),
            self.computer.snapshot(),
            Arc::new(runner),
            Arc::new(self.scenario_cache()),
            loader,
            self.stage_options(),
        )
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
