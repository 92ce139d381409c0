use anyhow::{Context, Result};
use futures::executor::block_on;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::builders::git::GitProvider;
use crate::builders::reporter::{ConsoleReporter, RegistrySnapshot, StatusReporter};
use crate::builders::validator::{ConfigValidator, RuleValidator, StandardValidator};
use crate::core::config::{ConfigManager, ConfigProvider, ExportFormat, ScmSettings};
use crate::core::input::ValidationResult;
use crate::core::service::ScmService;

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolves `--config`, defaulting to `scm-registry.toml` in the current directory.
pub fn config_manager(config: Option<PathBuf>) -> Result<ConfigManager> {
    match config {
        Some(path) => Ok(ConfigManager::new_at(path)),
        None => ConfigManager::new(),
    }
}

pub fn initialize(manager: &ConfigManager) -> Result<()> {
    if manager.initialize()? {
        println!("✓ Wrote default settings to {}", manager.get_config_path().display());
    } else {
        println!("Settings already exist at {}", manager.get_config_path().display());
    }
    Ok(())
}

pub fn validate(manager: &ConfigManager) -> Result<()> {
    let settings = manager.load_config()?;
    let issues = StandardValidator::new().validate_settings(&settings);

    if issues.is_empty() {
        println!("✓ Configuration is valid.");
        Ok(())
    } else {
        println!("⚠️  Found issues in configuration:");
        for issue in issues {
            println!("  - {issue}");
        }
        anyhow::bail!("Configuration validation failed.");
    }
}

/// Opens every configured repository and registers it with a fresh service.
///
/// Relative repository paths are resolved against `base_dir`. Each input gets
/// the configured rule validator and, if the repository has one, its commit
/// template as initial text.
pub fn build_service(settings: &ScmSettings, base_dir: &Path) -> Result<ScmService> {
    let service = ScmService::with_settings(settings.input.clone());
    let validator = RuleValidator::from_rules(&settings.validation)?.into_input_validator();

    for entry in &settings.repositories {
        let path = if entry.path.is_relative() {
            base_dir.join(&entry.path)
        } else {
            entry.path.clone()
        };
        let provider = GitProvider::open(&path, entry.label.as_deref())?;
        let repository = service.register(Rc::new(provider))?;

        let input = repository.input();
        input.set_validator(Rc::clone(&validator));
        if let Some(template) = repository.provider().commit_template() {
            input.set_value(template);
        }
        info!(provider = %repository.id(), "opened repository");
    }

    Ok(service)
}

fn load_service(manager: &ConfigManager) -> Result<ScmService> {
    let settings = manager.load_config()?;
    let base_dir = manager
        .get_config_path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    build_service(&settings, &base_dir)
}

/// `status`: register the configured repositories and report on them.
pub fn show_status(manager: &ConfigManager, select: Option<&str>, format: Option<ExportFormat>, verbose: bool) -> Result<()> {
    let service = load_service(manager)?;

    if let Some(id) = select {
        let repository = service
            .repository(id)
            .with_context(|| format!("No repository with id '{id}'"))?;
        service.set_selected_repository(Some(repository));
    }

    let snapshot = RegistrySnapshot::capture(&service);
    match format {
        Some(format) => println!("{}", snapshot.render(format)?),
        None => ConsoleReporter::new(verbose).generate_status_report(&snapshot)?,
    }
    Ok(())
}

/// `check`: put `message` into a repository's input and run its validator.
pub fn check_message(manager: &ConfigManager, message: &str, repo: Option<&str>) -> Result<Option<ValidationResult>> {
    let service = load_service(manager)?;
    let repository = match repo {
        Some(id) => service
            .repository(id)
            .with_context(|| format!("No repository with id '{id}'"))?,
        None => service
            .selected_repository()
            .context("No repositories configured")?,
    };

    let input = repository.input();
    input.set_value(message);
    let validator = input.validator();
    Ok(block_on(validator(&input.value())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{RepositoryEntry, ValidationRule};
    use crate::core::input::ValidationSeverity;
    use git2::Repository;
    use tempfile::tempdir;

    #[test]
    fn builds_service_from_settings() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path().join("one")).unwrap();
        Repository::init(dir.path().join("two")).unwrap();

        let mut settings = ScmSettings::default();
        settings.input.default_placeholder = "Message".to_string();
        settings.repositories = vec![
            RepositoryEntry { path: "one".into(), label: Some("One".to_string()) },
            RepositoryEntry { path: "two".into(), label: None },
        ];

        let service = build_service(&settings, dir.path()).unwrap();
        let repositories = service.repositories();
        assert_eq!(repositories.len(), 2);
        assert_eq!(repositories[0].provider().label(), "One");
        assert_eq!(repositories[1].provider().label(), "two");
        assert_eq!(repositories[1].input().placeholder(), "Message");
        assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &repositories[0]));
    }

    #[test]
    fn check_uses_configured_rules() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path().join("repo")).unwrap();

        let mut settings = ScmSettings::default();
        settings.repositories.push(RepositoryEntry { path: "repo".into(), label: None });
        settings.validation.push(ValidationRule {
            pattern: "^WIP".to_string(),
            message: "Work in progress".to_string(),
            severity: ValidationSeverity::Warning,
        });

        let manager = ConfigManager::new_at(dir.path().join("scm-registry.toml"));
        manager.save_config(&settings).unwrap();

        let result = check_message(&manager, "WIP: half done", None).unwrap();
        assert_eq!(result, Some(ValidationResult::new("Work in progress", ValidationSeverity::Warning)));
        assert_eq!(check_message(&manager, "done", None).unwrap(), None);
        assert!(check_message(&manager, "done", Some("git:nowhere")).is_err());
    }
}
