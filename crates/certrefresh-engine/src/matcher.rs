//! Tracing-key matching of certificate names
//!
//! A certificate belongs to key `K` under the account prefix `P` when its name
//! starts with `P`, followed by optional whitespace, followed by `K`. Both `P`
//! and `K` are matched literally.
//!
//! In [`MatchMode::Strict`] the key must also end at a boundary: the name ends,
//! or continues with a character that cannot be part of a key (anything other
//! than ASCII alphanumerics, `_`, `-` and `.`). [`MatchMode::Prefix`] drops
//! that requirement, so key `foo` also claims `foobar`.

use crate::error::{RefreshError, RefreshResult};
use certrefresh_cdn::Certificate;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the end of the tracing key is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Key must be followed by the end of the name or a non-key character
    #[default]
    Strict,
    /// Key may be followed by anything
    Prefix,
}

impl MatchMode {
    /// Configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Strict => "strict",
            MatchMode::Prefix => "prefix",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = RefreshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(MatchMode::Strict),
            "prefix" => Ok(MatchMode::Prefix),
            other => Err(RefreshError::configuration(format!(
                "unknown tracing key match mode '{}' (expected 'strict' or 'prefix')",
                other
            ))),
        }
    }
}

/// Compiled name predicate for one prefix and key
#[derive(Debug, Clone)]
pub struct TracingKeyMatcher {
    key: String,
    pattern: Regex,
}

impl TracingKeyMatcher {
    /// Compile a matcher
    pub fn new(prefix: &str, key: &str, mode: MatchMode) -> RefreshResult<Self> {
        let boundary = match mode {
            MatchMode::Strict => r"(?:$|[^\w.\-])",
            MatchMode::Prefix => "",
        };
        let source = format!(
            r"^{}\s*{}{}",
            regex_lite::escape(prefix),
            regex_lite::escape(key),
            boundary
        );
        let pattern = Regex::new(&source).map_err(|e| {
            RefreshError::configuration(format!("bad tracing key pattern '{}': {}", source, e))
        })?;

        Ok(TracingKeyMatcher {
            key: key.to_string(),
            pattern,
        })
    }

    /// The tracing key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a certificate name carries the key
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Certificates carrying the key, in input order
    pub fn filter(&self, certs: impl IntoIterator<Item = Certificate>) -> Vec<Certificate> {
        certs
            .into_iter()
            .filter(|c| self.matches(&c.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "[CertRefresh-Managed]";

    fn strict(key: &str) -> TracingKeyMatcher {
        TracingKeyMatcher::new(PREFIX, key, MatchMode::Strict).unwrap()
    }

    #[test]
    fn test_generated_names_match() {
        let m = strict("www");
        assert!(m.matches("[CertRefresh-Managed] www (1700000000000000000)"));
        assert!(m.matches("[CertRefresh-Managed]www"));
        assert!(m.matches("[CertRefresh-Managed] \t www"));
    }

    #[test]
    fn test_prefix_is_literal() {
        // Brackets would form a character class if unescaped.
        let m = strict("www");
        assert!(!m.matches("C www (1)"));
        assert!(!m.matches("x[CertRefresh-Managed] www (1)"));
    }

    #[test]
    fn test_key_is_literal() {
        let m = strict("a.b");
        assert!(m.matches("[CertRefresh-Managed] a.b (1)"));
        assert!(!m.matches("[CertRefresh-Managed] axb (1)"));
    }

    #[test]
    fn test_strict_rejects_longer_keys() {
        let m = strict("foo");
        assert!(!m.matches("[CertRefresh-Managed] foobar (1)"));
        assert!(!m.matches("[CertRefresh-Managed] foo.example.com (1)"));
        assert!(!m.matches("[CertRefresh-Managed] foo-staging (1)"));
        assert!(!m.matches("[CertRefresh-Managed] foo_2 (1)"));
        assert!(m.matches("[CertRefresh-Managed] foo/2"));
    }

    #[test]
    fn test_prefix_mode_accepts_longer_keys() {
        let m = TracingKeyMatcher::new(PREFIX, "foo", MatchMode::Prefix).unwrap();
        assert!(m.matches("[CertRefresh-Managed] foobar (1)"));
        assert!(m.matches("[CertRefresh-Managed] foo (1)"));
        assert!(!m.matches("[CertRefresh-Managed] fo (1)"));
    }

    #[test]
    fn test_filter_keeps_order() {
        let m = strict("www");
        let cert = |id: &str, name: &str| Certificate {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        };
        let kept = m.filter(vec![
            cert("1", "[CertRefresh-Managed] www (3)"),
            cert("2", "[CertRefresh-Managed] api (2)"),
            cert("3", "[CertRefresh-Managed] www (1)"),
            cert("4", "manual www"),
        ]);
        let ids: Vec<_> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<MatchMode>().unwrap(), MatchMode::Strict);
        assert_eq!(" Prefix ".parse::<MatchMode>().unwrap(), MatchMode::Prefix);
        assert!(matches!(
            "fuzzy".parse::<MatchMode>(),
            Err(RefreshError::Configuration(_))
        ));
        assert_eq!(MatchMode::default().to_string(), "strict");
    }
}
