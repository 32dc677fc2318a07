use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;
use std::collections::HashSet;

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, returning the first problem found
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        if self.accounts.is_empty() {
            return Err(ConfigError::MissingRequired("accounts".to_string()));
        }

        let mut seen = HashSet::new();
        for (index, account) in self.accounts.iter().enumerate() {
            account.validate().map_err(|e| match e {
                ConfigError::MissingRequired(field) => {
                    ConfigError::MissingRequired(format!("accounts[{}].{}", index, field))
                }
                other => other,
            })?;

            if !seen.insert(account.display_name.as_str()) {
                return Err(ConfigError::ConflictingValues(format!(
                    "display name '{}' is used by more than one account",
                    account.display_name
                )));
            }
        }

        self.api.validate()?;
        self.refresh.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for AccountConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.ak.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ak".to_string()));
        }

        if self.sk.trim().is_empty() {
            return Err(ConfigError::MissingRequired("sk".to_string()));
        }

        Ok(())
    }
}

impl Validator for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        let rest = self
            .host
            .strip_prefix("https://")
            .or_else(|| self.host.strip_prefix("http://"));

        match rest {
            None => Err(ConfigError::invalid_value(
                "api.host",
                format!("must start with http:// or https://, got {}", self.host),
            )),
            Some(rest) if rest.trim_end_matches('/').is_empty() => Err(
                ConfigError::invalid_value("api.host", "host name is empty"),
            ),
            Some(_) if self.timeout_secs == 0 => Err(ConfigError::invalid_value(
                "api.timeout_secs",
                "must be at least 1",
            )),
            Some(_) => Ok(()),
        }
    }
}

impl Validator for RefreshConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "refresh.max_concurrency",
                "must be at least 1",
            ));
        }

        let valid_modes = ["strict", "prefix"];
        let mode = self.tracing_key_match.trim().to_ascii_lowercase();
        if !valid_modes.contains(&mode.as_str()) {
            return Err(ConfigError::invalid_value(
                "refresh.tracing_key_match",
                format!("must be one of: {}", valid_modes.join(", ")),
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if let Some(level) = &self.log_level {
            if !valid_levels.contains(&level.as_str()) {
                return Err(ConfigError::invalid_value(
                    "observability.log_level",
                    format!("must be one of: {}", valid_levels.join(", ")),
                ));
            }
        }

        let valid_formats = ["pretty", "compact", "json", "text"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_with_account() -> Config {
        Config {
            accounts: vec![AccountConfig::new("0123456789", "secret")],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config_with_account().validate().is_ok());
    }

    #[test]
    fn test_requires_an_account() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref f) if f == "accounts"));
    }

    #[test]
    fn test_empty_secret_key() {
        let mut config = config_with_account();
        config.accounts[0].sk = " ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref f) if f == "accounts[0].sk"));
    }

    #[test]
    fn test_duplicate_display_names() {
        let mut config = config_with_account();
        config.accounts.push(AccountConfig::new("0129999789", "other"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingValues(_))
        ));
    }

    #[test]
    fn test_api_host() {
        let mut api = ApiConfig::default();
        assert!(api.validate().is_ok());

        api.host = "http://127.0.0.1:8080".to_string();
        assert!(api.validate().is_ok());

        api.host = "api.qiniu.com".to_string();
        assert!(api.validate().is_err());

        api.host = "https://".to_string();
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            api.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "api.timeout_secs"
        ));
    }

    #[test]
    fn test_refresh_settings() {
        let mut refresh = RefreshConfig::default();
        refresh.max_concurrency = 0;
        assert!(refresh.validate().is_err());

        refresh.max_concurrency = 1;
        refresh.tracing_key_match = "fuzzy".to_string();
        assert!(refresh.validate().is_err());

        refresh.tracing_key_match = "prefix".to_string();
        assert!(refresh.validate().is_ok());
    }

    #[test]
    fn test_match_mode_is_case_insensitive() {
        let mut refresh = RefreshConfig {
            tracing_key_match: "Prefix".to_string(),
            ..Default::default()
        };
        assert!(refresh.validate().is_ok());

        refresh.tracing_key_match = " STRICT".to_string();
        assert!(refresh.validate().is_ok());
    }

    #[test]
    fn test_observability_settings() {
        let mut obs = ObservabilityConfig::default();
        assert!(obs.validate().is_ok());

        obs.log_level = Some("verbose".to_string());
        assert!(obs.validate().is_err());

        obs.log_level = Some("debug".to_string());
        obs.log_format = "xml".to_string();
        assert!(obs.validate().is_err());

        obs.log_format = "compact".to_string();
        assert!(obs.validate().is_ok());
    }
}
