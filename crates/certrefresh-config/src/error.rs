// Copyright (C) 2025  certrefresh Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a configuration could not be loaded or accepted
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML in configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Invalid YAML in configuration: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid JSON in configuration: {0}")]
    JsonParseError(#[from] serde_json::error::Error),

    /// File extension other than toml, yaml, yml or json
    #[error("Unsupported configuration extension .{0} (expected toml, yaml, yml or json)")]
    UnsupportedFormat(String),

    #[error("No configuration file at {}", .0.display())]
    FileNotFound(PathBuf),

    /// Path without an extension to pick a parser from
    #[error("Cannot tell the format of {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("{variable_name}={value} is not usable: {reason}")]
    EnvVarParsingError {
        variable_name: String,
        value: String,
        reason: String,
    },

    #[error("{field} {reason}")]
    InvalidValue { field: String, reason: String },

    /// Names the missing field or environment variable
    #[error("Missing required setting {0}")]
    MissingRequired(String),

    #[error("Conflicting configuration: {0}")]
    ConflictingValues(String),
}

impl ConfigError {
    pub(crate) fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
