// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// Relative paths in the file are resolved against the file's directory,
/// so a config works no matter where the tool is started from.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let mut config = ConfigFile::try_from(raw_config)?;

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        resolve_relative_paths(&mut config, base);
    }
    Ok(config)
}

/// Resolve every relative path in `config` against `base`.
pub fn resolve_relative_paths(config: &mut ConfigFile, base: &Path) {
    let resolve = |p: &mut PathBuf| {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    };

    resolve(&mut config.paths.data_dir);
    resolve(&mut config.paths.cache_dir);
    resolve(&mut config.paths.features_dir);
    resolve(&mut config.paths.profiles_dir);
    resolve(&mut config.binaries.extract);
    resolve(&mut config.binaries.contract);
    if let Some(ref mut server) = config.binaries.server {
        resolve(server);
    }
    for lib in config.binaries.libraries.iter_mut() {
        resolve(lib);
    }
    if let Some(ref mut lib_path) = config.pipeline.library_path {
        resolve(lib_path);
    }
}

/// Default config location: `FixtureCache.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("FixtureCache.toml")
}
