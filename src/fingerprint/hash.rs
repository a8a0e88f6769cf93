// src/fingerprint/hash.rs

//! Hash primitives shared by every fingerprint in the crate.
//!
//! All fingerprints are lower-case hex blake3 digests. They are only ever
//! compared against other fingerprints produced by the same checkout, never
//! across machines.

use std::fmt;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use tracing::debug;

use crate::errors::{CacheError, Result};
use crate::fs::FileSystem;

/// An opaque, fixed-format cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn from_hasher(hasher: &Hasher) -> Self {
        Fingerprint(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash the full contents of `paths` through one cumulative context.
///
/// Files are fed in exactly the order given; callers that enumerate a
/// directory must sort the listing first. A missing or unreadable file is a
/// [`CacheError::HashError`].
pub fn hash_files<I, P>(fs: &dyn FileSystem, paths: I) -> Result<Fingerprint>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    for path in paths {
        let path = path.as_ref();
        debug!("hashing file {:?}", path);
        feed_file(fs, path, &mut hasher).map_err(|err| CacheError::HashError {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        })?;
    }

    let hash = Fingerprint::from_hasher(&hasher);
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

fn feed_file(fs: &dyn FileSystem, path: &Path, hasher: &mut Hasher) -> anyhow::Result<()> {
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(())
}

/// Hash arbitrary text.
pub fn hash_string(s: &str) -> Fingerprint {
    let mut hasher = Hasher::new();
    hasher.update(s.as_bytes());
    Fingerprint::from_hasher(&hasher)
}

/// Fold `delta` into `base`: `hash_string(base + "-" + delta)`.
pub fn update_fingerprint(base: &Fingerprint, delta: &str) -> Fingerprint {
    hash_string(&format!("{}-{}", base, delta))
}

/// Fold an argument list into `base`, one link per argument.
///
/// The count goes first and every argument is its own step, so two lists
/// only collide if they are equal: `["--a", "b c"]` and `["--a b", "c"]`
/// give different fingerprints.
pub fn update_with_args(base: &Fingerprint, args: &[String]) -> Fingerprint {
    args.iter().fold(
        update_fingerprint(base, &args.len().to_string()),
        |acc, arg| update_fingerprint(&acc, arg),
    )
}
