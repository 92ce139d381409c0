use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::core::event::{Emitter, Subscription};
use crate::core::input::ScmInput;
use crate::core::provider::ScmProvider;
use crate::core::service::ServiceState;

/// A registered provider paired with its input model and selection flag.
///
/// Created by [`crate::core::service::ScmService::register`]; the only way to
/// unregister is [`ScmRepository::dispose`].
pub struct ScmRepository {
    provider: Rc<dyn ScmProvider>,
    input: ScmInput,
    selected: Cell<bool>,
    on_did_focus: Emitter<()>,
    on_did_change_selection: Emitter<bool>,
    service: Weak<ServiceState>,
}

impl ScmRepository {
    pub(crate) fn new(provider: Rc<dyn ScmProvider>, input: ScmInput, service: Weak<ServiceState>) -> Self {
        Self {
            provider,
            input,
            selected: Cell::new(false),
            on_did_focus: Emitter::new(),
            on_did_change_selection: Emitter::new(),
            service,
        }
    }

    pub fn id(&self) -> &str {
        self.provider.id()
    }

    pub fn provider(&self) -> &Rc<dyn ScmProvider> {
        &self.provider
    }

    pub fn input(&self) -> &ScmInput {
        &self.input
    }

    /// Asks views showing this repository to reveal it. No state changes.
    pub fn focus(&self) {
        self.on_did_focus.fire(&());
    }

    pub fn selected(&self) -> bool {
        self.selected.get()
    }

    /// Assigns the flag and notifies, even if the value did not change.
    pub fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
        self.on_did_change_selection.fire(&selected);
    }

    pub fn on_did_focus(&self, listener: impl Fn(&()) + 'static) -> Subscription {
        self.on_did_focus.event(listener)
    }

    pub fn on_did_change_selection(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.on_did_change_selection.event(listener)
    }

    /// Unregisters from the owning service and disposes the provider.
    ///
    /// Calling this again is harmless for the registry (the entry is already
    /// gone); the provider's `dispose` is forwarded on every call.
    pub fn dispose(&self) {
        if let Some(service) = self.service.upgrade() {
            service.unregister(self);
        } else {
            debug!(provider = %self.id(), "service already dropped; skipping unregister");
        }
        self.provider.dispose();
    }
}

impl fmt::Debug for ScmRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmRepository")
            .field("id", &self.id())
            .field("label", &self.provider.label())
            .field("selected", &self.selected.get())
            .field("input", &self.input)
            .finish()
    }
}
