// src/descriptor.rs

//! Content-addressed paths for one scenario's map data.

use std::path::{Path, PathBuf};

use crate::fingerprint::{hash_string, Fingerprint};

/// Where a piece of map data lives at each pipeline stage.
///
/// All three paths are *base* paths: the pipeline appends `.<suffix>` to
/// them for every artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsmDataDescriptor {
    content: String,
    content_hash: Fingerprint,
    input_extension: String,
    raw_path: PathBuf,
    extracted_path: PathBuf,
    contracted_path: PathBuf,
}

impl OsmDataDescriptor {
    /// Derive all paths for `content`. Pure; touches no filesystem.
    ///
    /// The raw name is a hash of the content hash, which keeps it short and
    /// keeps content out of file names.
    pub fn derive(
        data_dir: &Path,
        content: impl Into<String>,
        extract: &Fingerprint,
        contract: &Fingerprint,
        input_extension: &str,
    ) -> Self {
        let content = content.into();
        let content_hash = hash_string(&content);
        let raw_name = hash_string(content_hash.as_str()).to_string();

        let raw_path = data_dir.join(&raw_name);
        let extracted_path = data_dir.join(format!("{raw_name}_{extract}"));
        let contracted_path = data_dir.join(format!("{raw_name}_{extract}_{contract}"));

        Self {
            content,
            content_hash,
            input_extension: input_extension.to_string(),
            raw_path,
            extracted_path,
            contracted_path,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_hash(&self) -> &Fingerprint {
        &self.content_hash
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn extracted_path(&self) -> &Path {
        &self.extracted_path
    }

    pub fn contracted_path(&self) -> &Path {
        &self.contracted_path
    }

    /// The file the raw content is written to, e.g. `<raw>.osm`.
    pub fn input_file(&self) -> PathBuf {
        with_suffix(&self.raw_path, &self.input_extension)
    }
}

/// `base` + `.` + `suffix`, without treating any dot in `base` as an
/// extension.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}
