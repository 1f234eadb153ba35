// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # Unirep common
//!
//! Ambient plumbing shared by the state engine crates:
//!
//! * [`configuration`]: layered configuration (defaults, then a TOML file, then `UNIREP_*` environment variables),
//!   and the [`DefaultConfigLoader`] trait that pulls a typed section out of it.
//! * [`logging`]: log4rs bootstrap from a YAML file.

use std::path::PathBuf;

pub mod configuration;
pub mod dir_utils;
pub mod logging;

pub use configuration::{
    load_configuration,
    loader::{ConfigLoader, ConfigPath, ConfigurationError, DefaultConfigLoader},
};
pub use logging::{get_log_configuration_path, initialize_logging};

pub const DEFAULT_CONFIG: &str = "config.toml";
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
pub const ENV_PREFIX: &str = "UNIREP";

const LOG_TARGET: &str = "c::common";

/// Locations of the configuration and log configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBootstrap {
    pub config: PathBuf,
    /// The path to the log configuration file. It is set using the following precedence set:
    ///   1. from the command-line parameter,
    ///   2. from the `UNIREP_LOG_CONFIGURATION` environment variable,
    ///   3. from a default value, usually `~/.unirep/log4rs.yml` (or OS equivalent).
    pub log_config: PathBuf,
}

impl ConfigBootstrap {
    /// Resolves both paths, falling back to the defaults in the data directory.
    pub fn new(config: Option<PathBuf>, log_config: Option<PathBuf>) -> Self {
        Self {
            config: config.unwrap_or_else(|| dir_utils::default_path(DEFAULT_CONFIG)),
            log_config: get_log_configuration_path(log_config),
        }
    }
}

impl Default for ConfigBootstrap {
    fn default() -> Self {
        ConfigBootstrap {
            config: dir_utils::default_path(DEFAULT_CONFIG),
            log_config: dir_utils::default_path(DEFAULT_LOG_CONFIG),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bootstrap_prefers_given_paths() {
        let bootstrap = ConfigBootstrap::new(Some(PathBuf::from("a.toml")), Some(PathBuf::from("b.yml")));
        assert_eq!(bootstrap.config, PathBuf::from("a.toml"));
        assert_eq!(bootstrap.log_config, PathBuf::from("b.yml"));
        let bootstrap = ConfigBootstrap::new(None, Some(PathBuf::from("b.yml")));
        assert!(bootstrap.config.ends_with(DEFAULT_CONFIG));
    }
}
