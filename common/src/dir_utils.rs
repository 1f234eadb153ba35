// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::path::PathBuf;

pub const DATA_DIR_NAME: &str = ".unirep";

/// Returns `~/.unirep/<filename>`, or `./.unirep/<filename>` if there is no home directory.
pub fn default_path(filename: &str) -> PathBuf {
    let mut home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(DATA_DIR_NAME);
    home.push(filename);
    home
}
