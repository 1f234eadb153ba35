// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

pub mod loader;
mod utils;

pub use utils::{load_configuration, load_configuration_from_str};
