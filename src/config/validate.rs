// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CacheError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CacheError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.paths,
            raw.binaries,
            raw.pipeline,
            raw.server,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_binaries(cfg)?;
    validate_pipeline(cfg)?;
    validate_server(cfg)?;
    Ok(())
}

fn validate_binaries(cfg: &RawConfigFile) -> Result<()> {
    let b = &cfg.binaries;
    if b.extract.as_os_str().is_empty() {
        return Err(config_error("[binaries].extract must not be empty"));
    }
    if b.contract.as_os_str().is_empty() {
        return Err(config_error("[binaries].contract must not be empty"));
    }
    if let Some(lib) = b.libraries.iter().find(|l| l.as_os_str().is_empty()) {
        return Err(CacheError::ConfigError(format!(
            "[binaries].libraries contains an empty path ({:?})",
            lib
        )));
    }
    Ok(())
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    let p = &cfg.pipeline;

    if p.profile.trim().is_empty() {
        return Err(config_error("[pipeline].profile must not be empty"));
    }

    let ext = &p.input_extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
        return Err(CacheError::ConfigError(format!(
            "[pipeline].input_extension must be a bare extension like \"osm\" (got {:?})",
            ext
        )));
    }

    if p.library_path_var.is_some() && p.library_path.is_none() {
        return Err(config_error(
            "[pipeline].library_path_var is set but [pipeline].library_path is not",
        ));
    }

    if p.log_tail_lines == 0 {
        return Err(config_error("[pipeline].log_tail_lines must be >= 1 (got 0)"));
    }

    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ref addr) = cfg.server.address {
        if !addr.contains(':') {
            return Err(CacheError::ConfigError(format!(
                "[server].address must be host:port (got {:?})",
                addr
            )));
        }
    }
    Ok(())
}

fn config_error(msg: &str) -> CacheError {
    CacheError::ConfigError(msg.to_string())
}
