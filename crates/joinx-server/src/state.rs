//! # Application State
//!
//! Shared by all request handlers through `Arc`. The rule registry is immutable and
//! read without locking; the only mutable piece is the set of disabled rules, kept
//! behind a `RwLock` that is never held across an `.await`.

use crate::config::ServerConfig;
use joinx_core::rule::{RuleId, RuleRegistry};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

pub struct AppState {
    /// Every rule the service can apply.
    pub rule_registry: Arc<RuleRegistry>,
    disabled: RwLock<BTreeSet<RuleId>>,
    pub config: ServerConfig,
}

impl AppState {
    /// State with the built-in rules and the startup disabled set from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let registry = joinx_rules::default_rule_registry();
        Self {
            rule_registry: Arc::new(registry),
            disabled: RwLock::new(config.disabled_rules.iter().copied().collect()),
            config,
        }
    }

    pub fn is_enabled(&self, id: RuleId) -> bool {
        !self
            .disabled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Registered rules that are not disabled, in id order.
    pub fn enabled_rules(&self) -> Vec<RuleId> {
        let disabled = self.disabled.read().unwrap_or_else(PoisonError::into_inner);
        self.rule_registry
            .ids()
            .filter(|id| !disabled.contains(id))
            .collect()
    }

    pub fn disabled_rules(&self) -> Vec<RuleId> {
        self.disabled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Enable then disable; a rule named in both lists ends up disabled.
    pub fn configure(&self, enable: &[RuleId], disable: &[RuleId]) {
        let mut disabled = self.disabled.write().unwrap_or_else(PoisonError::into_inner);
        for id in enable {
            disabled.remove(id);
        }
        disabled.extend(disable.iter().copied());
    }
}
