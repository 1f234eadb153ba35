// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Typed access to sections of a layered [`Config`].
//!
//! A section type names its table with [`ConfigPath::main_key_prefix`]. [`DefaultConfigLoader`] then fills every key
//! the loaded configuration does not mention from the type's `Default` impl, so a configuration file only needs to
//! carry the values it changes.

use std::{
    error::Error,
    fmt::{Display, Formatter},
};

use config::{Config, Value};

pub trait ConfigPath {
    /// Main configuration section
    fn main_key_prefix() -> &'static str;

    /// Layers `config` over `defaults` under `main_key_prefix()`, so that the section can be deserialized from the
    /// result even when the loaded configuration omits it.
    fn merge_subconfig(config: &Config, defaults: Value) -> Result<Config, ConfigurationError> {
        Ok(Config::builder()
            .set_default(Self::main_key_prefix(), defaults)?
            .add_source(config.clone())
            .build()?)
    }
}

pub trait ConfigLoader: ConfigPath + for<'de> serde::de::Deserialize<'de> {
    /// Try to load configuration from supplied Config by `main_key_prefix()`.
    ///
    /// Default values are only taken from `#[serde(default)]` attributes. For automated inheritance of Default
    /// values use DefaultConfigLoader.
    fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        let merger = Self::merge_subconfig(config, Value::default())?;
        Ok(merger.get(Self::main_key_prefix())?)
    }
}

impl<C> ConfigLoader for C where C: ConfigPath + for<'de> serde::de::Deserialize<'de> {}

pub trait DefaultConfigLoader:
    ConfigPath + Default + serde::ser::Serialize + for<'de> serde::de::Deserialize<'de>
{
    /// Try to load configuration from supplied Config by `main_key_prefix()`.
    ///
    /// Default values will be taken from Default impl for struct
    fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        let default = <Self as Default>::default();
        let buf = serde_json::to_string(&default)?;
        let value: Value = serde_json::from_str(buf.as_str())?;
        let merger = Self::merge_subconfig(config, value)?;
        Ok(merger.get(Self::main_key_prefix())?)
    }
}

impl<C> DefaultConfigLoader for C where C: ConfigPath + Default + serde::ser::Serialize + for<'de> serde::de::Deserialize<'de>
{}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    field: String,
    message: String,
}

impl ConfigurationError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        ConfigurationError {
            field: field.into(),
            message: msg.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "Invalid value for {}: {}", self.field, self.message)
    }
}

impl Error for ConfigurationError {}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        use config::ConfigError;
        match err {
            ConfigError::FileParse { uri: Some(uri), cause } => Self {
                field: uri,
                message: cause.to_string(),
            },
            ConfigError::Type { ref key, .. } => Self {
                field: key.clone().unwrap_or_default(),
                message: err.to_string(),
            },
            ConfigError::NotFound(key) => Self {
                field: key,
                message: "required key not found".to_string(),
            },
            x => Self::new("", x.to_string()),
        }
    }
}

impl From<serde_json::error::Error> for ConfigurationError {
    fn from(err: serde_json::error::Error) -> Self {
        Self {
            field: "".to_string(),
            message: err.to_string(),
        }
    }
}
