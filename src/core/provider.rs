use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::event::{Emitter, Subscription};

/// A command a provider exposes to outer layers (status bar, accept-input).
/// The registry never executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmCommand {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl ScmCommand {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tooltip: None,
            arguments: Vec::new(),
        }
    }
}

/// One changed resource inside a group, e.g. a modified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmResource {
    pub uri: String,
    /// Short status letter or tag for decorations ("M", "A", "D", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoration: Option<String>,
}

impl ScmResource {
    pub fn new(uri: impl Into<String>, decoration: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            decoration: decoration.map(str::to_string),
        }
    }
}

/// A labelled list of resources with its own change channel.
pub struct ScmResourceGroup {
    id: String,
    label: String,
    hide_when_empty: bool,
    resources: RefCell<Vec<ScmResource>>,
    on_did_change: Emitter<()>,
}

impl ScmResourceGroup {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            hide_when_empty: false,
            resources: RefCell::new(Vec::new()),
            on_did_change: Emitter::new(),
        }
    }

    pub fn hidden_when_empty(mut self) -> Self {
        self.hide_when_empty = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn hide_when_empty(&self) -> bool {
        self.hide_when_empty
    }

    pub fn resources(&self) -> Vec<ScmResource> {
        self.resources.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.resources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.borrow().is_empty()
    }

    /// Replaces the group's resources and notifies subscribers.
    pub fn splice(&self, resources: Vec<ScmResource>) {
        *self.resources.borrow_mut() = resources;
        self.on_did_change.fire(&());
    }

    pub fn on_did_change(&self, listener: impl Fn(&()) + 'static) -> Subscription {
        self.on_did_change.event(listener)
    }
}

impl fmt::Debug for ScmResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmResourceGroup")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("resources", &self.len())
            .finish()
    }
}

/// Capability set of one source-control backend.
///
/// The registry only reads [`ScmProvider::id`] (for uniqueness) and forwards
/// [`ScmProvider::dispose`]; everything else passes through to whoever renders
/// or drives the provider.
pub trait ScmProvider {
    fn label(&self) -> &str;

    /// Stable identifier, unique among registered providers. Must not be empty.
    fn id(&self) -> &str;

    fn handle(&self) -> u32;

    fn groups(&self) -> Vec<Rc<ScmResourceGroup>>;

    fn root_uri(&self) -> Option<String> {
        None
    }

    /// Badge count; defaults to the number of resources across all groups.
    fn count(&self) -> usize {
        self.groups().iter().map(|g| g.len()).sum()
    }

    fn commit_template(&self) -> Option<String> {
        None
    }

    fn accept_input_command(&self) -> Option<ScmCommand> {
        None
    }

    fn status_bar_commands(&self) -> Vec<ScmCommand> {
        Vec::new()
    }

    /// Subscribes to the primary change channel, fired whenever groups or
    /// resources change.
    fn on_did_change(&self, listener: Box<dyn Fn(&())>) -> Subscription;

    /// `None` when the provider has no commit template channel.
    fn on_did_change_commit_template(&self, _listener: Box<dyn Fn(&String)>) -> Option<Subscription> {
        None
    }

    /// `None` when the provider has no status bar commands channel.
    fn on_did_change_status_bar_commands(
        &self,
        _listener: Box<dyn Fn(&Vec<ScmCommand>)>,
    ) -> Option<Subscription> {
        None
    }

    fn dispose(&self);
}
