// src/guard.rs

//! Start-up guard against a routing server left running by someone else.
//!
//! A stale server would answer the queries meant for the data this session
//! prepares, so its presence aborts the session before any stage runs.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{CacheError, Result};

/// Fail with [`CacheError::AlreadyRunning`] if something accepts TCP
/// connections at `address`.
///
/// A refused connection or a timeout both count as "nothing running".
pub async fn ensure_no_server(address: &str, probe_timeout: Duration) -> Result<()> {
    match timeout(probe_timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => {
            warn!(%address, "found a server already listening");
            Err(CacheError::AlreadyRunning(address.to_string()))
        }
        Ok(Err(e)) => {
            debug!(%address, error = %e, "no server listening");
            Ok(())
        }
        Err(_) => {
            debug!(%address, ?probe_timeout, "server probe timed out");
            Ok(())
        }
    }
}
