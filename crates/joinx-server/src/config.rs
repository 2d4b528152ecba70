//! # Server Configuration
//!
//! Settings come from defaults overridden by environment variables:
//!
//! | variable               | meaning                                         | default          |
//! |------------------------|-------------------------------------------------|------------------|
//! | `JOINX_LISTEN_ADDR`    | socket address to bind                          | `0.0.0.0:3000`   |
//! | `JOINX_DISABLED_RULES` | comma-separated rule ids disabled at startup    | (none)           |
//! | `JOINX_LOG`            | log filter used when `RUST_LOG` is not set      | `info,joinx=debug` |

use joinx_core::rule::{RuleId, UnknownRuleId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JOINX_DISABLED_RULES: {0}")]
    UnknownRule(#[from] UnknownRuleId),
}

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Rules disabled when the server starts; `POST /rules/configure` changes the
    /// set at runtime.
    pub disabled_rules: Vec<RuleId>,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            disabled_rules: Vec::new(),
            log_filter: "info,joinx=debug".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = var("JOINX_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(rules) = var("JOINX_DISABLED_RULES") {
            config.disabled_rules = rules
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Some(filter) = var("JOINX_LOG") {
            config.log_filter = filter;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_vars(vars(&[
            ("JOINX_LISTEN_ADDR", "127.0.0.1:8080"),
            ("JOINX_DISABLED_RULES", "LOGICAL_JOIN_COMMUTE, LOGICAL_JOIN_L_ASSCOM,"),
            ("JOINX_LOG", "warn"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(
            config.disabled_rules,
            vec![RuleId::JoinCommute, RuleId::JoinLAsscom]
        );
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let err = ServerConfig::from_vars(vars(&[("JOINX_DISABLED_RULES", "NOPE")])).unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }
}
