// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use log::*;

use crate::{ConfigurationError, ENV_PREFIX, LOG_TARGET};

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Loads the configuration file at `path` (a missing file is treated as empty) and layers `UNIREP_*` environment
/// variables over it. Nested keys use a double underscore, e.g. `UNIREP_PROTOCOL__EPOCH_TREE_DEPTH=128`.
pub fn load_configuration<P: AsRef<Path>>(path: P) -> Result<Config, ConfigurationError> {
    let path = path.as_ref();
    debug!(
        target: LOG_TARGET,
        "Loading configuration file from {}",
        path.to_str().unwrap_or("[??]")
    );
    if !path.exists() {
        info!(
            target: LOG_TARGET,
            "Configuration file {} does not exist, using defaults",
            path.display()
        );
    }
    let cfg = Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(environment())
        .build()?;
    info!(target: LOG_TARGET, "Configuration file loaded.");
    Ok(cfg)
}

/// Parses TOML text as a configuration, with the same environment overrides as [`load_configuration`].
pub fn load_configuration_from_str(toml: &str) -> Result<Config, ConfigurationError> {
    let cfg = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .add_source(environment())
        .build()?;
    Ok(cfg)
}
