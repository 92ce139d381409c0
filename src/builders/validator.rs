use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future;
use regex::Regex;
use std::collections::HashSet;
use std::rc::Rc;

use crate::core::config::{CONFIG_VERSION, ScmSettings, ValidationRule};
use crate::core::input::{InputValidator, ValidationResult};

/// The `ConfigValidator` trait defines the public interface for checking the
/// settings file before it is used.
pub trait ConfigValidator {
    /// Returns one human-readable line per problem found; empty means valid.
    fn validate_settings(&self, settings: &ScmSettings) -> Vec<String>;

    fn validate_rule(&self, rule: &ValidationRule) -> Vec<String>;
}

/// Standard checks: supported version, compilable rules with messages, no
/// repository listed twice.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }

    fn check_duplicate_repositories(&self, settings: &ScmSettings) -> Vec<String> {
        let mut seen = HashSet::new();
        settings
            .repositories
            .iter()
            .filter(|entry| !seen.insert(entry.path.clone()))
            .map(|entry| format!("Repository listed more than once: {}", entry.path.display()))
            .collect()
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_settings(&self, settings: &ScmSettings) -> Vec<String> {
        let mut issues = Vec::new();

        if settings.version != CONFIG_VERSION {
            issues.push(format!("Unsupported config version: {}", settings.version));
        }

        for rule in &settings.validation {
            issues.extend(self.validate_rule(rule));
        }
        issues.extend(self.check_duplicate_repositories(settings));

        issues
    }

    fn validate_rule(&self, rule: &ValidationRule) -> Vec<String> {
        let mut issues = Vec::new();

        if let Err(e) = Regex::new(&rule.pattern) {
            issues.push(format!("Invalid validation pattern '{}': {}", rule.pattern, e));
        }
        if rule.pattern.is_empty() {
            issues.push("Empty validation pattern matches every input".to_string());
        }
        if rule.message.trim().is_empty() {
            issues.push(format!("Validation rule '{}' has no message", rule.pattern));
        }

        issues
    }
}

/// Input validator built from configured regex rules.
///
/// Resolves to the first rule whose pattern matches the input, or `None`.
#[derive(Debug, Clone)]
pub struct RuleValidator {
    rules: Vec<(Regex, ValidationResult)>,
}

impl RuleValidator {
    pub fn from_rules(rules: &[ValidationRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern)
                    .with_context(|| format!("Invalid validation pattern '{}'", rule.pattern))?;
                Ok((regex, ValidationResult::new(rule.message.clone(), rule.severity)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn check(&self, text: &str) -> Option<ValidationResult> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, result)| result.clone())
    }

    pub fn into_input_validator(self) -> InputValidator {
        Rc::new(move |text: &str| future::ready(self.check(text)).boxed_local())
    }
}
