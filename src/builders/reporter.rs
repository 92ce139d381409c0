use anyhow::Result;
use futures::executor::block_on;
use serde::Serialize;

use crate::core::config::ExportFormat;
use crate::core::input::ValidationResult;
use crate::core::repository::ScmRepository;
use crate::core::service::ScmService;

/// Size of one resource group at the time of the snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupStatus {
    pub id: String,
    pub label: String,
    pub resources: usize,
}

/// One repository as the reporter sees it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepositoryStatus {
    pub id: String,
    pub label: String,
    pub handle: u32,
    /// Whether this is the service's selected repository.
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_uri: Option<String>,
    pub count: usize,
    pub groups: Vec<GroupStatus>,
    pub input_value: String,
    pub input_placeholder: String,
    pub input_visible: bool,
    /// What the input's validator says about the current value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

impl RepositoryStatus {
    /// Runs the input's validator on its current value to completion.
    pub fn from_repository(repository: &ScmRepository, selected: bool) -> Self {
        let provider = repository.provider();
        let input = repository.input();
        let value = input.value();
        let validation = block_on((input.validator())(&value));
        Self {
            id: repository.id().to_string(),
            label: provider.label().to_string(),
            handle: provider.handle(),
            selected,
            root_uri: provider.root_uri(),
            count: provider.count(),
            groups: provider
                .groups()
                .iter()
                .map(|g| GroupStatus {
                    id: g.id().to_string(),
                    label: g.label().to_string(),
                    resources: g.len(),
                })
                .collect(),
            input_value: value,
            input_placeholder: input.placeholder(),
            input_visible: input.visible(),
            validation,
        }
    }
}

/// Serializable view of a service: repositories in registration order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// Id of the selected repository, even if it is no longer registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    pub repositories: Vec<RepositoryStatus>,
}

impl RegistrySnapshot {
    pub fn capture(service: &ScmService) -> Self {
        let selected = service.selected_repository();
        let repositories = service
            .repositories()
            .iter()
            .map(|r| {
                let is_selected = selected.as_ref().is_some_and(|s| std::rc::Rc::ptr_eq(s, r));
                RepositoryStatus::from_repository(r, is_selected)
            })
            .collect();

        Self {
            selected: selected.map(|s| s.id().to_string()),
            repositories,
        }
    }

    pub fn render(&self, format: ExportFormat) -> Result<String> {
        format.render(self)
    }
}

pub trait StatusReporter {
    fn generate_status_report(&self, snapshot: &RegistrySnapshot) -> Result<()>;
}

/// Prints the snapshot to stdout for the `status` command.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_repository(&self, status: &RepositoryStatus) -> String {
        let marker = if status.selected { "●" } else { "○" };
        let groups = status
            .groups
            .iter()
            .map(|g| format!("{} {}", g.label, g.resources))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} {} [{}] ({} changes: {})",
            marker, status.label, status.id, status.count, groups
        )
    }
}

impl StatusReporter for ConsoleReporter {
    fn generate_status_report(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        println!("📊 Source Control Repositories");
        println!("==============================");

        if snapshot.repositories.is_empty() {
            println!("No repositories registered.");
            return Ok(());
        }

        for status in &snapshot.repositories {
            println!("{}", self.format_repository(status));
            if self.verbose {
                if let Some(root) = &status.root_uri {
                    println!("  └─ root: {root}");
                }
                if status.input_visible {
                    println!("  └─ input: {:?} (placeholder {:?})", status.input_value, status.input_placeholder);
                }
                if let Some(result) = &status.validation {
                    println!("  └─ {}: {}", result.severity, result.message);
                }
            }
        }

        if let Some(selected) = &snapshot.selected
            && !snapshot.repositories.iter().any(|r| &r.id == selected)
        {
            println!("\n⚠️  Selected repository '{selected}' is no longer registered");
        }

        println!("\n📈 Total repositories: {}", snapshot.repositories.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::memory::MemoryProvider;
    use crate::builders::validator::RuleValidator;
    use crate::core::config::ValidationRule;
    use crate::core::input::ValidationSeverity;
    use crate::core::provider::{ScmResource, ScmResourceGroup};
    use std::rc::Rc;

    #[test]
    fn snapshot_marks_selection_and_counts() {
        let service = ScmService::new();
        let a = Rc::new(MemoryProvider::new("a", "Repo A").with_root_uri("file:///a"));
        a.add_group(ScmResourceGroup::new("workingTree", "Changes"));
        a.splice("workingTree", vec![ScmResource::new("x.rs", Some("M"))]);
        service.register(a).unwrap();
        let b = service.register(Rc::new(MemoryProvider::new("b", "Repo B"))).unwrap();
        b.input().set_value("draft");

        let snapshot = RegistrySnapshot::capture(&service);
        assert_eq!(snapshot.selected.as_deref(), Some("a"));
        assert!(snapshot.repositories[0].selected);
        assert!(!snapshot.repositories[1].selected);
        assert_eq!(snapshot.repositories[0].count, 1);
        assert_eq!(snapshot.repositories[0].groups[0].resources, 1);
        assert_eq!(snapshot.repositories[1].input_value, "draft");
        assert_eq!(snapshot.repositories[1].validation, None);

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.render(ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["repositories"][1]["id"], "b");
        assert!(snapshot.render(ExportFormat::Yaml).unwrap().contains("Repo A"));
    }

    #[test]
    fn stale_selection_is_reported_by_id() {
        let service = ScmService::new();
        let a = service.register(Rc::new(MemoryProvider::new("a", "Repo A"))).unwrap();
        a.dispose();

        let snapshot = RegistrySnapshot::capture(&service);
        assert!(snapshot.repositories.is_empty());
        assert_eq!(snapshot.selected.as_deref(), Some("a"));
        ConsoleReporter::new(true).generate_status_report(&snapshot).unwrap();
    }

    #[test]
    fn snapshot_carries_validator_feedback() {
        let service = ScmService::new();
        let validator = RuleValidator::from_rules(&[ValidationRule {
            pattern: "^WIP".to_string(),
            message: "Work in progress".to_string(),
            severity: ValidationSeverity::Warning,
        }])
        .unwrap()
        .into_input_validator();

        let a = service.register(Rc::new(MemoryProvider::new("a", "Repo A"))).unwrap();
        a.input().set_validator(validator);
        a.input().set_value("WIP: half done");

        let snapshot = RegistrySnapshot::capture(&service);
        assert_eq!(
            snapshot.repositories[0].validation,
            Some(ValidationResult::new("Work in progress", ValidationSeverity::Warning))
        );

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.render(ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["repositories"][0]["validation"]["severity"], "warning");
        ConsoleReporter::new(true).generate_status_report(&snapshot).unwrap();

        a.input().set_value("feat: done");
        assert_eq!(RegistrySnapshot::capture(&service).repositories[0].validation, None);
    }
}
