// src/exec/process.rs

//! Child process runner.

use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;

use super::backend::{Invocation, ProcessOutput};

/// Run a single process to completion and capture its output.
///
/// Both pipes are drained concurrently with the wait, so a child that fills
/// its stderr buffer can never block on us.
pub async fn run_process(invocation: &Invocation) -> Result<ProcessOutput> {
    info!(
        program = ?invocation.program,
        args = ?invocation.args,
        cwd = ?invocation.cwd,
        "starting process"
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .envs(&invocation.env)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process {:?}", invocation.program))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr, status) = tokio::join!(
        collect_lines(stdout, "stdout"),
        collect_lines(stderr, "stderr"),
        child.wait(),
    );

    let status = status.with_context(|| format!("waiting for process {:?}", invocation.program))?;
    let exit_code = status.code().unwrap_or(-1);

    info!(
        program = ?invocation.program,
        exit_code,
        success = status.success(),
        "process exited"
    );

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
    })
}

/// Read a pipe to the end, logging every line at debug.
///
/// Output is decoded lossily; the bytes are always consumed in full.
async fn collect_lines<R>(pipe: Option<R>, stream: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return String::new();
    };

    let mut raw = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut raw).await {
        debug!(stream, error = %e, "error while reading process output");
    }

    let captured = String::from_utf8_lossy(&raw).into_owned();
    for line in captured.lines() {
        debug!(stream, "{}", line);
    }
    captured
}
