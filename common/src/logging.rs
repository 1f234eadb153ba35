// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use crate::{dir_utils, DEFAULT_LOG_CONFIG};

pub const LOG_CONFIGURATION_ENV: &str = "UNIREP_LOG_CONFIGURATION";

const SAMPLE_LOG_CONFIG: &str = include_str!("../logging/log4rs-sample.yml");

/// Resolves the log4rs configuration path: the command-line value if given, then `UNIREP_LOG_CONFIGURATION`, then
/// `~/.unirep/log4rs.yml`.
pub fn get_log_configuration_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path
        .or_else(|| {
            env::var_os(LOG_CONFIGURATION_ENV)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| dir_utils::default_path(DEFAULT_LOG_CONFIG))
}

/// Sets up log4rs from the given YAML file. Returns false (after printing why) if the file could not be loaded, in
/// which case nothing is logged.
pub fn initialize_logging(config_file: &Path) -> bool {
    println!(
        "Initializing logging according to {:?}",
        config_file.to_str().unwrap_or("[??]")
    );
    if let Err(e) = log4rs::init_file(config_file, Default::default()) {
        println!("We couldn't load a logging configuration file. {}", e);
        return false;
    }
    true
}

/// Writes the sample log configuration to `path`, creating parent directories as needed.
pub fn install_default_logfile_config(path: &Path) -> Result<(), std::io::Error> {
    if let Some(d) = path.parent() {
        fs::create_dir_all(d)?;
    }
    fs::write(path, SAMPLE_LOG_CONFIG)
}
