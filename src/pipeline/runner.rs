// src/pipeline/runner.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::descriptor::{with_suffix, OsmDataDescriptor};
use crate::errors::{CacheError, Result};
use crate::exec::{Invocation, ProcessExecutor};
use crate::fingerprint::Fingerprint;
use crate::fs::{write_atomic, FileSystem};
use crate::types::{PipelineStage, StageKind};

use super::stage::{CONTRACT_STAGE, EXTRACT_STAGE};

/// Number of output lines kept in `ExtractError` / `ContractError`.
pub const DEFAULT_LOG_TAIL_LINES: usize = 20;

/// Session-wide knobs of the runner.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub extract_bin: PathBuf,
    pub contract_bin: PathBuf,
    /// Working directory of both stage processes; also where the
    /// content-addressed artifacts live.
    pub data_root: PathBuf,
    /// Extension of the raw input file, without the dot.
    pub input_extension: String,
    /// Extra environment for the stage processes (e.g. a library search path).
    pub env: BTreeMap<String, String>,
    /// Ignore cached outputs and rerun every stage.
    pub force: bool,
    pub log_tail_lines: usize,
}

/// Per-scenario stage inputs.
///
/// These must be the same values the fingerprints were computed from,
/// otherwise the cache paths lie about their content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    pub profile: PathBuf,
    pub extract_args: Vec<String>,
    pub contract_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Outputs were already on disk.
    Skipped,
    /// The stage did its work in this call.
    Ran,
}

/// Result of a successful `reprocess`: the data is ready to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub write: StageOutcome,
    pub extract: StageOutcome,
    pub contract: StageOutcome,
    pub contracted_path: PathBuf,
}

impl PipelineReport {
    /// The single string handed to the loader.
    pub fn load_target(&self) -> String {
        self.contracted_path.to_string_lossy().into_owned()
    }
}

/// Drives one scenario's map data through write → extract → contract.
///
/// Holds no per-scenario state: every decision is re-derived from the
/// files on disk, since cache directories outlive the process.
pub struct PipelineRunner<E: ProcessExecutor> {
    fs: Arc<dyn FileSystem>,
    executor: E,
    settings: PipelineSettings,
}

impl<E: ProcessExecutor> fmt::Debug for PipelineRunner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<E: ProcessExecutor> PipelineRunner<E> {
    pub fn new(fs: Arc<dyn FileSystem>, executor: E, settings: PipelineSettings) -> Self {
        Self {
            fs,
            executor,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Descriptor for `content` under this runner's data root.
    pub fn describe(
        &self,
        content: impl Into<String>,
        extract: &Fingerprint,
        contract: &Fingerprint,
    ) -> OsmDataDescriptor {
        OsmDataDescriptor::derive(
            &self.settings.data_root,
            content,
            extract,
            contract,
            &self.settings.input_extension,
        )
    }

    pub fn is_extracted(&self, extracted_path: &Path) -> bool {
        EXTRACT_STAGE.is_complete(self.fs.as_ref(), extracted_path)
    }

    pub fn is_contracted(&self, contracted_path: &Path) -> bool {
        CONTRACT_STAGE.is_complete(self.fs.as_ref(), contracted_path)
    }

    /// Furthest stage whose outputs are on disk for `descriptor`.
    pub fn status(&self, descriptor: &OsmDataDescriptor) -> PipelineStage {
        if self.is_contracted(descriptor.contracted_path()) {
            PipelineStage::Contracted
        } else if self.is_extracted(descriptor.extracted_path()) {
            PipelineStage::Extracted
        } else if self.fs.exists(&descriptor.input_file()) {
            PipelineStage::Written
        } else {
            PipelineStage::NotWritten
        }
    }

    /// Bring `descriptor` to the contracted stage, doing only missing work.
    ///
    /// Stages run strictly one after another. Failures are not retried.
    pub async fn reprocess(
        &self,
        descriptor: &OsmDataDescriptor,
        options: &StageOptions,
    ) -> Result<PipelineReport> {
        let write = self.write(descriptor)?;
        let extract = self.extract(descriptor, options).await?;
        let contract = self.contract(descriptor, options).await?;

        info!(
            contracted = ?descriptor.contracted_path(),
            ?write,
            ?extract,
            ?contract,
            "map data ready to load"
        );

        Ok(PipelineReport {
            write,
            extract,
            contract,
            contracted_path: descriptor.contracted_path().to_path_buf(),
        })
    }

    fn write(&self, descriptor: &OsmDataDescriptor) -> Result<StageOutcome> {
        let input = descriptor.input_file();

        // Content addressed: an existing file has identical content.
        if self.fs.exists(&input) && !self.settings.force {
            info!(path = ?input, "raw input already written; skipping");
            return Ok(StageOutcome::Skipped);
        }

        write_atomic(self.fs.as_ref(), &input, descriptor.content().as_bytes())
            .map_err(|e| CacheError::file(&input, e))?;
        info!(path = ?input, bytes = descriptor.content().len(), "wrote raw input");
        Ok(StageOutcome::Ran)
    }

    async fn extract(
        &self,
        descriptor: &OsmDataDescriptor,
        options: &StageOptions,
    ) -> Result<StageOutcome> {
        let extracted = descriptor.extracted_path();
        if self.is_extracted(extracted) && !self.settings.force {
            info!(path = ?extracted, "already extracted; skipping");
            return Ok(StageOutcome::Skipped);
        }

        let invocation = Invocation::new(&self.settings.extract_bin, &self.settings.data_root)
            .arg(path_arg(&descriptor.input_file()))
            .args(options.extract_args.iter().cloned())
            .arg("--profile")
            .arg(path_arg(&options.profile))
            .envs(&self.settings.env);

        self.run_stage(StageKind::Extract, &invocation).await?;

        EXTRACT_STAGE.collect_outputs(self.fs.as_ref(), descriptor.raw_path(), extracted, |_| false)?;
        info!(path = ?extracted, "extraction complete");
        Ok(StageOutcome::Ran)
    }

    async fn contract(
        &self,
        descriptor: &OsmDataDescriptor,
        options: &StageOptions,
    ) -> Result<StageOutcome> {
        let contracted = descriptor.contracted_path();
        if self.is_contracted(contracted) && !self.settings.force {
            info!(path = ?contracted, "already contracted; skipping");
            return Ok(StageOutcome::Skipped);
        }

        let extracted = descriptor.extracted_path();
        let invocation = Invocation::new(&self.settings.contract_bin, &self.settings.data_root)
            .args(options.contract_args.iter().cloned())
            .arg(path_arg(&with_suffix(extracted, "core")))
            .envs(&self.settings.env);

        self.run_stage(StageKind::Contract, &invocation).await?;

        // Files the extraction stage owns stay where they are; other
        // scenarios with different contraction args still read them.
        CONTRACT_STAGE.collect_outputs(self.fs.as_ref(), extracted, contracted, |suffix| {
            EXTRACT_STAGE.owns(suffix)
        })?;
        info!(path = ?contracted, "contraction complete");
        Ok(StageOutcome::Ran)
    }

    async fn run_stage(&self, kind: StageKind, invocation: &Invocation) -> Result<()> {
        let output = self.executor.run(invocation).await?;
        if output.success() {
            return Ok(());
        }

        let code = output.exit_code;
        let log_tail = output.log_tail(self.settings.log_tail_lines);
        error!(stage = %kind, exit_code = code, "stage process failed");

        Err(match kind {
            StageKind::Extract => CacheError::ExtractError { code, log_tail },
            StageKind::Contract => CacheError::ContractError { code, log_tail },
        })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

