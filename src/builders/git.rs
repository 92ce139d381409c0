use anyhow::{Context, Result, anyhow};
use git2::{Repository, Status, StatusOptions};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

use crate::core::event::{Emitter, Subscription};
use crate::core::provider::{ScmCommand, ScmProvider, ScmResource, ScmResourceGroup};

use super::next_handle;

pub const INDEX_GROUP_ID: &str = "index";
pub const WORKING_TREE_GROUP_ID: &str = "workingTree";

/// Provider backed by a git working tree, read through libgit2.
///
/// Two groups are exposed: staged changes (`index`) and unstaged or
/// untracked changes (`workingTree`). Call [`GitProvider::refresh`] to rescan.
pub struct GitProvider {
    repo: Repository,
    id: String,
    label: String,
    handle: u32,
    root: PathBuf,
    index_group: Rc<ScmResourceGroup>,
    working_tree_group: Rc<ScmResourceGroup>,
    commit_template: RefCell<Option<String>>,
    disposed: Cell<bool>,
    on_did_change: Emitter<()>,
    on_did_change_commit_template: Emitter<String>,
}

impl GitProvider {
    /// Opens the repository at `path` and performs an initial scan.
    pub fn open<P: AsRef<Path>>(path: P, label: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open git repository at {}", path.display()))?;
        let root = repo
            .workdir()
            .ok_or_else(|| anyhow!("Bare repositories have no working tree: {}", path.display()))?
            .to_path_buf();

        let label = match label {
            Some(label) => label.to_string(),
            None => root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "git".to_string()),
        };

        let provider = Self {
            repo,
            id: format!("git:{}", root.display()),
            label,
            handle: next_handle(),
            root,
            index_group: Rc::new(ScmResourceGroup::new(INDEX_GROUP_ID, "Staged Changes").hidden_when_empty()),
            working_tree_group: Rc::new(ScmResourceGroup::new(WORKING_TREE_GROUP_ID, "Changes")),
            commit_template: RefCell::new(None),
            disposed: Cell::new(false),
            on_did_change: Emitter::new(),
            on_did_change_commit_template: Emitter::new(),
        };
        provider.refresh()?;
        Ok(provider)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Rescans status and the commit template, then fires the change channels.
    pub fn refresh(&self) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }

        let (staged, unstaged) = self.collect_changes()?;
        debug!(
            provider = %self.id,
            staged = staged.len(),
            unstaged = unstaged.len(),
            "refreshed git status"
        );
        self.index_group.splice(staged);
        self.working_tree_group.splice(unstaged);

        let template = self.read_commit_template();
        let template_changed = *self.commit_template.borrow() != template;
        if template_changed {
            *self.commit_template.borrow_mut() = template.clone();
            if let Some(template) = template {
                self.on_did_change_commit_template.fire(&template);
            }
        }

        self.on_did_change.fire(&());
        Ok(())
    }

    fn collect_changes(&self) -> Result<(Vec<ScmResource>, Vec<ScmResource>)> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .context("Failed to read repository status")?;

        let mut staged = Vec::new();
        let mut unstaged = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();
            if let Some(letter) = index_decoration(status) {
                staged.push(ScmResource::new(path, Some(letter)));
            }
            if let Some(letter) = working_tree_decoration(status) {
                unstaged.push(ScmResource::new(path, Some(letter)));
            }
        }
        Ok((staged, unstaged))
    }

    fn read_commit_template(&self) -> Option<String> {
        let config = self.repo.config().ok()?;
        let path = config.get_path("commit.template").ok()?;
        let path = if path.is_relative() { self.root.join(path) } else { path };
        fs::read_to_string(path).ok()
    }
}

fn index_decoration(status: Status) -> Option<&'static str> {
    if status.contains(Status::INDEX_NEW) {
        Some("A")
    } else if status.contains(Status::INDEX_MODIFIED) {
        Some("M")
    } else if status.contains(Status::INDEX_DELETED) {
        Some("D")
    } else if status.contains(Status::INDEX_RENAMED) {
        Some("R")
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        Some("T")
    } else {
        None
    }
}

fn working_tree_decoration(status: Status) -> Option<&'static str> {
    if status.contains(Status::CONFLICTED) {
        Some("!")
    } else if status.contains(Status::WT_NEW) {
        Some("U")
    } else if status.contains(Status::WT_MODIFIED) {
        Some("M")
    } else if status.contains(Status::WT_DELETED) {
        Some("D")
    } else if status.contains(Status::WT_RENAMED) {
        Some("R")
    } else if status.contains(Status::WT_TYPECHANGE) {
        Some("T")
    } else {
        None
    }
}

impl ScmProvider for GitProvider {
    fn label(&self) -> &str {
        &self.label
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self) -> u32 {
        self.handle
    }

    fn groups(&self) -> Vec<Rc<ScmResourceGroup>> {
        vec![Rc::clone(&self.index_group), Rc::clone(&self.working_tree_group)]
    }

    fn root_uri(&self) -> Option<String> {
        Some(format!("file://{}", self.root.display()))
    }

    fn commit_template(&self) -> Option<String> {
        self.commit_template.borrow().clone()
    }

    fn accept_input_command(&self) -> Option<ScmCommand> {
        Some(ScmCommand {
            id: "git.commit".to_string(),
            title: "Commit".to_string(),
            tooltip: Some("Commit staged changes".to_string()),
            arguments: vec![self.root.display().to_string()],
        })
    }

    fn on_did_change(&self, listener: Box<dyn Fn(&())>) -> Subscription {
        self.on_did_change.event(listener)
    }

    fn on_did_change_commit_template(&self, listener: Box<dyn Fn(&String)>) -> Option<Subscription> {
        Some(self.on_did_change_commit_template.event(listener))
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        debug!(provider = %self.id, "disposing git provider");
        self.on_did_change.dispose();
        self.on_did_change_commit_template.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn splits_staged_and_untracked() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("staged.txt"), "a\n").unwrap();
        fs::write(dir.path().join("loose.txt"), "b\n").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        let provider = GitProvider::open(dir.path(), Some("fixture")).unwrap();
        assert_eq!(provider.label(), "fixture");
        assert!(provider.id().starts_with("git:"));

        let groups = provider.groups();
        let staged = groups[0].resources();
        let unstaged = groups[1].resources();
        assert_eq!(staged, vec![ScmResource::new("staged.txt", Some("A"))]);
        assert_eq!(unstaged, vec![ScmResource::new("loose.txt", Some("U"))]);
        assert_eq!(provider.count(), 2);
    }

    #[test]
    fn refresh_picks_up_new_files_and_dispose_is_idempotent() {
        let dir = tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let provider = GitProvider::open(dir.path(), None).unwrap();
        assert_eq!(provider.count(), 0);

        fs::write(dir.path().join("new.txt"), "x\n").unwrap();
        provider.refresh().unwrap();
        assert_eq!(provider.count(), 1);

        let changes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&changes);
        let _sub = provider.on_did_change(Box::new(move |_: &()| counter.set(counter.get() + 1)));

        provider.dispose();
        provider.dispose();
        assert!(provider.is_disposed());

        // Closed channels stay silent and refresh is a no-op.
        fs::write(dir.path().join("later.txt"), "y\n").unwrap();
        provider.refresh().unwrap();
        assert_eq!(changes.get(), 0);
        assert_eq!(provider.count(), 1);
    }

    #[test]
    fn open_fails_outside_a_repository() {
        let dir = tempdir().unwrap();
        assert!(GitProvider::open(dir.path().join("nope"), None).is_err());
    }
}
