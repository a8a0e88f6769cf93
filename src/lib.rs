// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod errors;
pub mod exec;
pub mod fingerprint;
pub mod fs;
pub mod guard;
pub mod logging;
pub mod pipeline;
pub mod scenario;
pub mod session;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::context::{PrintLoader, Scenario, ScenarioContext};
use crate::errors::{CacheError, Result};
use crate::exec::RealProcessExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::session::Session;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - session start-up (server guard, fingerprints)
/// - scenario context (pipeline runner, scenario cache, loader)
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)?;
    if args.force {
        cfg.pipeline.force = true;
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut session = Session::start(cfg, Arc::clone(&fs)).await?;
    if let Some(ref profile) = args.profile {
        session.set_profile(profile)?;
    }

    let map_data = read_text(fs.as_ref(), &args.input)?;
    let ctx = session.context(RealProcessExecutor::new(), Arc::new(PrintLoader));

    if args.dry_run {
        print_dry_run(&ctx, &map_data);
        return Ok(());
    }

    match args.feature {
        Some(ref feature) => {
            let spec_content = read_text(fs.as_ref(), feature)?;
            let scenario = Scenario {
                spec_path: feature,
                spec_content: &spec_content,
                title: &args.scenario,
                line: args.line,
                map_data: &map_data,
            };
            ctx.prepare(&scenario).await?;
        }
        None => {
            ctx.reprocess_and_load(&map_data).await?;
        }
    }

    Ok(())
}

fn read_text(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    fs.read_to_string(path).map_err(CacheError::from)
}

/// Dry-run output: fingerprints, derived paths, current stage.
fn print_dry_run(ctx: &ScenarioContext<RealProcessExecutor>, map_data: &str) {
    let fp = ctx.fingerprints();
    let descriptor = ctx.descriptor(map_data);

    println!("fixture-cache dry-run");
    println!("  fingerprint.binary   = {}", fp.binary);
    println!("  fingerprint.profile  = {}", fp.profile);
    println!("  fingerprint.extract  = {}", fp.extract);
    println!("  fingerprint.contract = {}", fp.contract);
    println!();
    println!("  input      = {}", descriptor.input_file().display());
    println!("  extracted  = {}", descriptor.extracted_path().display());
    println!("  contracted = {}", descriptor.contracted_path().display());
    println!("  stage      = {}", ctx.runner().status(&descriptor));
    println!("  data root  = {}", ctx.runner().settings().data_root.display());
    println!("  scenarios  = {}", ctx.scenario_cache().cache_root().display());

    debug!("dry-run complete (no execution)");
}
