// src/context.rs

//! Per-scenario composition of the cache components.
//!
//! A `ScenarioContext` holds typed handles to everything a scenario needs
//! and is built once per fingerprint state by the session. Scenarios call
//! through it; nothing is attached to a shared ambient object.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info};

use crate::descriptor::OsmDataDescriptor;
use crate::errors::{CacheError, Result};
use crate::exec::ProcessExecutor;
use crate::fingerprint::Fingerprints;
use crate::fs::{write_atomic, FileSystem};
use crate::pipeline::{PipelineReport, PipelineRunner, StageOptions};
use crate::scenario::{ScenarioCache, ScenarioCacheEntry, ScenarioFiles};

/// Receives the contracted base path once the data is ready.
///
/// Starting and feeding a routing server is someone else's job; the
/// pipeline only hands over the path.
pub trait Loader: Send + Sync {
    fn load<'a>(
        &'a self,
        contracted_base: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Loader for the CLI: prints the path on stdout for the next tool.
#[derive(Debug, Clone, Default)]
pub struct PrintLoader;

impl Loader for PrintLoader {
    fn load<'a>(
        &'a self,
        contracted_base: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            println!("{contracted_base}");
            Ok(())
        })
    }
}

/// One scenario of a specification document.
#[derive(Debug, Clone)]
pub struct Scenario<'a> {
    pub spec_path: &'a Path,
    pub spec_content: &'a str,
    pub title: &'a str,
    pub line: u32,
    /// Generated map data.
    pub map_data: &'a str,
}

#[derive(Debug, Clone)]
pub struct PreparedScenario {
    pub entry: ScenarioCacheEntry,
    pub files: ScenarioFiles,
    pub descriptor: OsmDataDescriptor,
    pub report: PipelineReport,
}

pub struct ScenarioContext<E: ProcessExecutor> {
    fs: Arc<dyn FileSystem>,
    fingerprints: Fingerprints,
    runner: Arc<PipelineRunner<E>>,
    scenario_cache: Arc<ScenarioCache>,
    loader: Arc<dyn Loader>,
    options: StageOptions,
}

impl<E: ProcessExecutor> fmt::Debug for ScenarioContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("fingerprints", &self.fingerprints)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: ProcessExecutor> ScenarioContext<E> {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        fingerprints: Fingerprints,
        runner: Arc<PipelineRunner<E>>,
        scenario_cache: Arc<ScenarioCache>,
        loader: Arc<dyn Loader>,
        options: StageOptions,
    ) -> Self {
        Self {
            fs,
            fingerprints,
            runner,
            scenario_cache,
            loader,
            options,
        }
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        &self.fingerprints
    }

    pub fn runner(&self) -> &PipelineRunner<E> {
        &self.runner
    }

    pub fn scenario_cache(&self) -> &ScenarioCache {
        &self.scenario_cache
    }

    pub fn descriptor(&self, map_data: &str) -> OsmDataDescriptor {
        self.runner
            .describe(map_data, &self.fingerprints.extract, &self.fingerprints.contract)
    }

    /// Run the pipeline for `map_data` and hand the result to the loader.
    pub async fn reprocess_and_load(&self, map_data: &str) -> Result<PipelineReport> {
        let descriptor = self.descriptor(map_data);
        let report = self.runner.reprocess(&descriptor, &self.options).await?;
        self.loader.load(&report.load_target()).await?;
        Ok(report)
    }

    /// Full scenario preparation: scenario cache directory, a copy of the
    /// map data next to the scenario for debugging, pipeline, loader.
    pub async fn prepare(&self, scenario: &Scenario<'_>) -> Result<PreparedScenario> {
        let entry = self
            .scenario_cache
            .for_scenario(scenario.spec_path, scenario.spec_content)?;
        let files = entry.scenario(scenario.title, scenario.line);

        let osm_copy = files.osm_file();
        if !self.fs.exists(&osm_copy) {
            write_atomic(self.fs.as_ref(), &osm_copy, scenario.map_data.as_bytes())
                .map_err(|e| CacheError::file(&osm_copy, e))?;
            debug!(path = ?osm_copy, "stored scenario map data");
        }

        let descriptor = self.descriptor(scenario.map_data);
        let report = self.runner.reprocess(&descriptor, &self.options).await?;
        self.loader.load(&report.load_target()).await?;

        info!(
            scenario = scenario.title,
            line = scenario.line,
            contracted = ?report.contracted_path,
            "scenario prepared"
        );

        Ok(PreparedScenario {
            entry,
            files,
            descriptor,
            report,
        })
    }
}
