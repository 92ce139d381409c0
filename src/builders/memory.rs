use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::event::{Emitter, Subscription};
use crate::core::provider::{ScmCommand, ScmProvider, ScmResource, ScmResourceGroup};

use super::next_handle;

/// A provider whose groups and metadata are set by hand.
///
/// Useful for embedding hosts that compute changes themselves, and for tests.
/// Counts how often it was disposed.
pub struct MemoryProvider {
    id: String,
    label: String,
    handle: u32,
    root_uri: Option<String>,
    groups: RefCell<Vec<Rc<ScmResourceGroup>>>,
    commit_template: RefCell<Option<String>>,
    status_bar_commands: RefCell<Vec<ScmCommand>>,
    accept_input_command: Option<ScmCommand>,
    dispose_count: Cell<usize>,
    on_did_change: Emitter<()>,
    on_did_change_commit_template: Emitter<String>,
    on_did_change_status_bar_commands: Emitter<Vec<ScmCommand>>,
}

impl MemoryProvider {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            handle: next_handle(),
            root_uri: None,
            groups: RefCell::new(Vec::new()),
            commit_template: RefCell::new(None),
            status_bar_commands: RefCell::new(Vec::new()),
            accept_input_command: None,
            dispose_count: Cell::new(0),
            on_did_change: Emitter::new(),
            on_did_change_commit_template: Emitter::new(),
            on_did_change_status_bar_commands: Emitter::new(),
        }
    }

    pub fn with_root_uri(mut self, root_uri: impl Into<String>) -> Self {
        self.root_uri = Some(root_uri.into());
        self
    }

    pub fn with_accept_input_command(mut self, command: ScmCommand) -> Self {
        self.accept_input_command = Some(command);
        self
    }

    /// Adds a group and fires the provider's change channel.
    pub fn add_group(&self, group: ScmResourceGroup) -> Rc<ScmResourceGroup> {
        let group = Rc::new(group);
        self.groups.borrow_mut().push(Rc::clone(&group));
        self.on_did_change.fire(&());
        group
    }

    /// Replaces the resources of the group `group_id`; returns `false` if no such group.
    pub fn splice(&self, group_id: &str, resources: Vec<ScmResource>) -> bool {
        let group = self.groups.borrow().iter().find(|g| g.id() == group_id).cloned();
        match group {
            Some(group) => {
                group.splice(resources);
                self.on_did_change.fire(&());
                true
            }
            None => false,
        }
    }

    pub fn set_commit_template(&self, template: impl Into<String>) {
        let template = template.into();
        *self.commit_template.borrow_mut() = Some(template.clone());
        self.on_did_change_commit_template.fire(&template);
    }

    pub fn set_status_bar_commands(&self, commands: Vec<ScmCommand>) {
        *self.status_bar_commands.borrow_mut() = commands.clone();
        self.on_did_change_status_bar_commands.fire(&commands);
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_count.get()
    }
}

impl ScmProvider for MemoryProvider {
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
        self.groups.borrow().clone()
    }

    fn root_uri(&self) -> Option<String> {
        self.root_uri.clone()
    }

    fn commit_template(&self) -> Option<String> {
        self.commit_template.borrow().clone()
    }

    fn accept_input_command(&self) -> Option<ScmCommand> {
        self.accept_input_command.clone()
    }

    fn status_bar_commands(&self) -> Vec<ScmCommand> {
        self.status_bar_commands.borrow().clone()
    }

    fn on_did_change(&self, listener: Box<dyn Fn(&())>) -> Subscription {
        self.on_did_change.event(listener)
    }

    fn on_did_change_commit_template(&self, listener: Box<dyn Fn(&String)>) -> Option<Subscription> {
        Some(self.on_did_change_commit_template.event(listener))
    }

    fn on_did_change_status_bar_commands(
        &self,
        listener: Box<dyn Fn(&Vec<ScmCommand>)>,
    ) -> Option<Subscription> {
        Some(self.on_did_change_status_bar_commands.event(listener))
    }

    fn dispose(&self) {
        self.dispose_count.set(self.dispose_count.get() + 1);
    }
}
