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
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{AccountConfig, Config, DEFAULT_CONFIG_PATH};
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Number of accounts configured through the environment
pub const ENV_NUM_ACCOUNTS: &str = "CERTREFRESH_NUM_ACCOUNTS";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Where the configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// This file only
    File(PathBuf),
    /// `CERTREFRESH_*` environment variables only
    Environment,
    /// Environment if `CERTREFRESH_NUM_ACCOUNTS` is set, else [`DEFAULT_CONFIG_PATH`]
    Auto,
}

impl ConfigSource {
    /// Source selected by the `--config` and `--env-config` flags
    pub fn from_flags(config_path: Option<PathBuf>, env_config: bool) -> ConfigResult<Self> {
        match (config_path, env_config) {
            (Some(_), true) => Err(ConfigError::ConflictingValues(
                "cannot force configuration from both environment and file".to_string(),
            )),
            (Some(path), false) => Ok(ConfigSource::File(path)),
            (None, true) => Ok(ConfigSource::Environment),
            (None, false) => Ok(ConfigSource::Auto),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from the process environment and/or a file
    pub async fn load(&self, source: &ConfigSource) -> ConfigResult<Config> {
        self.load_with_env(source, |name| std::env::var(name).ok())
            .await
    }

    /// Like [`load`](Self::load), reading variables through `env`
    pub async fn load_with_env<F>(&self, source: &ConfigSource, env: F) -> ConfigResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match source {
            ConfigSource::File(path) => {
                debug!("forced configuration from file: {}", path.display());
                self.read_file(path).await?
            }
            ConfigSource::Environment => {
                debug!("forced configuration from environment");
                from_env(&env)?.ok_or_else(|| ConfigError::MissingRequired(ENV_NUM_ACCOUNTS.to_string()))?
            }
            ConfigSource::Auto => {
                debug!("trying configuration from environment");
                match from_env(&env)? {
                    Some(config) => config,
                    None => {
                        debug!("falling back to default config file: {}", DEFAULT_CONFIG_PATH);
                        self.read_file(Path::new(DEFAULT_CONFIG_PATH)).await?
                    }
                }
            }
        };

        apply_env_overrides(&mut config, &env)?;
        self.finish(config)
    }

    /// Load configuration from a file, without environment overrides
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let config = self.read_file(path.as_ref()).await?;
        self.finish(config)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config = parse(content, format)?;
        self.finish(config)
    }

    async fn read_file(&self, path: &Path) -> ConfigResult<Config> {
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        parse(&content, format)
    }

    fn finish(&self, mut config: Config) -> ConfigResult<Config> {
        config.fill_defaults();

        if self.validate {
            config.validate()?;
            debug!(
                accounts = config.accounts.len(),
                "Configuration validated successfully"
            );
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(content: &str, format: ConfigFormat) -> ConfigResult<Config> {
    let config = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    debug!("Configuration parsed from {}", format.name());
    Ok(config)
}

fn account_var(index: usize, kind: &str) -> String {
    format!("CERTREFRESH_ACCOUNT_{}_{}", index, kind)
}

/// Read accounts from `CERTREFRESH_NUM_ACCOUNTS` and `CERTREFRESH_ACCOUNT_<i>_*`
///
/// Returns `None` when `CERTREFRESH_NUM_ACCOUNTS` is unset or empty.
pub fn from_env<F>(env: F) -> ConfigResult<Option<Config>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(ENV_NUM_ACCOUNTS).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let count: usize = raw.trim().parse().map_err(|_| {
        ConfigError::env_var_parsing_error(ENV_NUM_ACCOUNTS, &raw, "expected a non-negative integer")
    })?;

    let mut accounts = Vec::with_capacity(count);
    for index in 1..=count {
        let required = |kind: &str| {
            let name = account_var(index, kind);
            env(&name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingRequired(name))
        };

        accounts.push(AccountConfig {
            ak: required("AK")?,
            sk: required("SK")?,
            display_name: env(&account_var(index, "DISPLAY_NAME")).unwrap_or_default(),
            managed_cert_name_prefix: env(&account_var(index, "MANAGED_CERT_NAME_PREFIX"))
                .unwrap_or_default(),
        });
    }

    Ok(Some(Config {
        accounts,
        ..Default::default()
    }))
}

/// Apply `CERTREFRESH_*` setting overrides
pub fn apply_env_overrides<F>(config: &mut Config, env: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    // API settings
    if let Some(value) = env("CERTREFRESH_API_HOST") {
        config.api.host = value;
    }
    if let Some(value) = env("CERTREFRESH_API_TIMEOUT_SECS") {
        config.api.timeout_secs = value.parse().map_err(|_| {
            ConfigError::env_var_parsing_error(
                "CERTREFRESH_API_TIMEOUT_SECS",
                &value,
                "expected a number of seconds",
            )
        })?;
    }

    // Refresh settings
    if let Some(value) = env("CERTREFRESH_MAX_CONCURRENCY") {
        config.refresh.max_concurrency = value.parse().map_err(|_| {
            ConfigError::env_var_parsing_error(
                "CERTREFRESH_MAX_CONCURRENCY",
                &value,
                "expected valid integer",
            )
        })?;
    }
    if let Some(value) = env("CERTREFRESH_TRACING_KEY_MATCH") {
        config.refresh.tracing_key_match = value;
    }

    // Observability settings
    if let Some(value) = env("CERTREFRESH_LOG_LEVEL") {
        config.observability.log_level = Some(value);
    }
    if let Some(value) = env("CERTREFRESH_LOG_FORMAT") {
        config.observability.log_format = value;
    }

    Ok(())
}
