use serde::{Deserialize, Serialize};
use std::fmt;

/// Config file looked up when neither a path nor the environment is given
pub const DEFAULT_CONFIG_PATH: &str = "certrefresh.toml";

/// Name prefix of managed certificates when an account sets none
pub const DEFAULT_MANAGED_CERT_NAME_PREFIX: &str = "[CertRefresh-Managed]";

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Provider accounts, processed in order
    pub accounts: Vec<AccountConfig>,

    /// Provider API endpoint settings
    pub api: ApiConfig,

    /// Refresh behaviour
    pub refresh: RefreshConfig,

    /// Observability settings
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Fill in per-account defaults (display name, certificate name prefix)
    /// and bring the tracing key match mode to its canonical spelling
    pub fn fill_defaults(&mut self) {
        for account in &mut self.accounts {
            account.fill_defaults();
        }
        let mode = self.refresh.tracing_key_match.trim().to_ascii_lowercase();
        self.refresh.tracing_key_match = mode;
    }

    /// Find an account by display name
    pub fn account(&self, display_name: &str) -> Option<&AccountConfig> {
        self.accounts
            .iter()
            .find(|a| a.display_name == display_name)
    }
}

/// One provider account
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccountConfig {
    /// Access key
    pub ak: String,

    /// Secret key
    pub sk: String,

    /// Name used in logs and reports; derived from the access key when empty
    #[serde(default)]
    pub display_name: String,

    /// Prefix of managed certificate names; [`DEFAULT_MANAGED_CERT_NAME_PREFIX`] when empty
    #[serde(default)]
    pub managed_cert_name_prefix: String,
}

impl AccountConfig {
    /// Create an account with defaults filled in
    pub fn new(ak: impl Into<String>, sk: impl Into<String>) -> Self {
        let mut account = AccountConfig {
            ak: ak.into(),
            sk: sk.into(),
            ..Default::default()
        };
        account.fill_defaults();
        account
    }

    /// Fill in the display name and prefix when left empty
    pub fn fill_defaults(&mut self) {
        if self.display_name.is_empty() {
            self.display_name = default_display_name(&self.ak);
        }
        if self.managed_cert_name_prefix.is_empty() {
            self.managed_cert_name_prefix = DEFAULT_MANAGED_CERT_NAME_PREFIX.to_string();
        }
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("ak", &self.ak)
            .field("sk", &"***")
            .field("display_name", &self.display_name)
            .field("managed_cert_name_prefix", &self.managed_cert_name_prefix)
            .finish()
    }
}

/// Display name shown for an account without one: the first and last three
/// characters of the access key
pub fn default_display_name(ak: &str) -> String {
    let chars: Vec<char> = ak.chars().collect();
    if chars.len() < 6 {
        return "***".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Provider API endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// API root URL
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Refresh behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
    /// Concurrent domain updates across all accounts
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Tracing key matching: "strict" or "prefix", case-insensitive
    #[serde(default = "default_tracing_key_match")]
    pub tracing_key_match: String,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level; `RUST_LOG` decides when unset
    #[serde(default)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: default_api_host(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            max_concurrency: default_max_concurrency(),
            tracing_key_match: default_tracing_key_match(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: None,
            log_format: default_log_format(),
        }
    }
}

// Default value functions
fn default_api_host() -> String {
    "https://api.qiniu.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    8
}

fn default_tracing_key_match() -> String {
    "strict".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_display_name() {
        assert_eq!(default_display_name("abcdefghij"), "abc***hij");
        assert_eq!(default_display_name("abcdef"), "abc***def");
        assert_eq!(default_display_name("abcde"), "***");
        assert_eq!(default_display_name(""), "***");
    }

    #[test]
    fn test_fill_defaults_keeps_explicit_values() {
        let mut account = AccountConfig {
            ak: "AKAKAKAKAK".into(),
            sk: "SK".into(),
            display_name: "prod".into(),
            managed_cert_name_prefix: "[Mine]".into(),
        };
        account.fill_defaults();
        assert_eq!(account.display_name, "prod");
        assert_eq!(account.managed_cert_name_prefix, "[Mine]");
    }

    #[test]
    fn test_new_account_has_defaults() {
        let account = AccountConfig::new("0123456789", "secret");
        assert_eq!(account.display_name, "012***789");
        assert_eq!(account.managed_cert_name_prefix, DEFAULT_MANAGED_CERT_NAME_PREFIX);
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let account = AccountConfig::new("0123456789", "super-secret");
        assert!(!format!("{:?}", account).contains("super-secret"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.accounts.is_empty());
        assert_eq!(config.api.host, "https://api.qiniu.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.refresh.max_concurrency, 8);
        assert_eq!(config.refresh.tracing_key_match, "strict");
        assert_eq!(config.observability.log_level, None);
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_fill_defaults_normalizes_match_mode() {
        let mut config = Config::default();
        config.refresh.tracing_key_match = " Prefix ".to_string();
        config.fill_defaults();
        assert_eq!(config.refresh.tracing_key_match, "prefix");
    }

    #[test]
    fn test_account_lookup() {
        let mut config = Config::default();
        config.accounts.push(AccountConfig::new("0123456789", "s"));
        assert!(config.account("012***789").is_some());
        assert!(config.account("nope").is_none());
    }
}
