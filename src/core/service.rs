use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::core::config::InputSettings;
use crate::core::error::ScmError;
use crate::core::event::{Emitter, Subscription};
use crate::core::input::ScmInput;
use crate::core::provider::ScmProvider;
use crate::core::repository::ScmRepository;

/// Shared state behind [`ScmService`]. Repositories keep a weak reference to
/// it so that [`ScmRepository::dispose`] can unregister them.
pub(crate) struct ServiceState {
    repositories: RefCell<Vec<Rc<ScmRepository>>>,
    provider_ids: RefCell<HashSet<String>>,
    selected: RefCell<Option<Rc<ScmRepository>>>,
    input_settings: InputSettings,
    on_did_add_repository: Emitter<Rc<ScmRepository>>,
    on_did_remove_repository: Emitter<Rc<ScmRepository>>,
    on_did_change_selected_repository: Emitter<Option<Rc<ScmRepository>>>,
}

impl ServiceState {
    /// Removes `repository` by identity. Unknown repositories are ignored.
    pub(crate) fn unregister(&self, repository: &ScmRepository) {
        let removed = {
            let mut repositories = self.repositories.borrow_mut();
            let Some(index) = repositories
                .iter()
                .position(|r| std::ptr::eq(Rc::as_ptr(r), repository))
            else {
                return;
            };
            let removed = repositories.remove(index);
            self.provider_ids.borrow_mut().remove(removed.id());
            removed
        };

        debug!(provider = %removed.id(), "unregistered SCM provider");
        self.on_did_remove_repository.fire(&removed);
    }
}

/// Registry of source-control providers.
///
/// Holds the registered repositories in insertion order, enforces unique
/// provider ids and tracks the globally selected repository. All delivery is
/// synchronous; listeners may call back into the service or dispose
/// repositories while being notified.
pub struct ScmService {
    state: Rc<ServiceState>,
}

impl ScmService {
    pub fn new() -> Self {
        Self::with_settings(InputSettings::default())
    }

    /// Like [`ScmService::new`], seeding every new input model from `input_settings`.
    pub fn with_settings(input_settings: InputSettings) -> Self {
        Self {
            state: Rc::new(ServiceState {
                repositories: RefCell::new(Vec::new()),
                provider_ids: RefCell::new(HashSet::new()),
                selected: RefCell::new(None),
                input_settings,
                on_did_add_repository: Emitter::new(),
                on_did_remove_repository: Emitter::new(),
                on_did_change_selected_repository: Emitter::new(),
            }),
        }
    }

    /// Registers `provider` and returns its repository.
    ///
    /// The first repository registered into an empty service becomes the
    /// selected one. Dispose the returned repository to unregister it.
    pub fn register(&self, provider: Rc<dyn ScmProvider>) -> Result<Rc<ScmRepository>, ScmError> {
        let id = provider.id().to_string();
        if id.is_empty() {
            return Err(ScmError::InvalidProviderId {
                label: provider.label().to_string(),
            });
        }
        if !self.state.provider_ids.borrow_mut().insert(id.clone()) {
            warn!(provider = %id, "rejected duplicate SCM provider registration");
            return Err(ScmError::DuplicateProvider { id });
        }

        let input = ScmInput::with_settings(&self.state.input_settings);
        let repository = Rc::new(ScmRepository::new(provider, input, Rc::downgrade(&self.state)));
        let is_first = {
            let mut repositories = self.state.repositories.borrow_mut();
            repositories.push(Rc::clone(&repository));
            repositories.len() == 1
        };

        debug!(provider = %id, first = is_first, "registered SCM provider");
        self.state.on_did_add_repository.fire(&repository);

        // An add-listener may already have disposed it.
        if is_first && self.contains(&repository) {
            self.set_selected_repository(Some(Rc::clone(&repository)));
        }

        Ok(repository)
    }

    /// Snapshot of the registered repositories in insertion order.
    pub fn repositories(&self) -> Vec<Rc<ScmRepository>> {
        self.state.repositories.borrow().clone()
    }

    pub fn repository(&self, id: &str) -> Option<Rc<ScmRepository>> {
        self.state
            .repositories
            .borrow()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Whether `repository` is currently registered here (by identity).
    pub fn contains(&self, repository: &Rc<ScmRepository>) -> bool {
        self.state
            .repositories
            .borrow()
            .iter()
            .any(|r| Rc::ptr_eq(r, repository))
    }

    pub fn len(&self) -> usize {
        self.state.repositories.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.repositories.borrow().is_empty()
    }

    /// The current selection. Removing the selected repository does not clear
    /// it, so this can return a repository that is no longer registered.
    pub fn selected_repository(&self) -> Option<Rc<ScmRepository>> {
        self.state.selected.borrow().clone()
    }

    /// Assigns the selection and always notifies, including for the same
    /// repository or `None`. Membership is not checked.
    pub fn set_selected_repository(&self, repository: Option<Rc<ScmRepository>>) {
        *self.state.selected.borrow_mut() = repository.clone();
        debug!(
            provider = repository.as_deref().map(ScmRepository::id).unwrap_or("<none>"),
            "selected SCM repository changed"
        );
        self.state.on_did_change_selected_repository.fire(&repository);
    }

    pub fn input_settings(&self) -> &InputSettings {
        &self.state.input_settings
    }

    pub fn on_did_add_repository(&self, listener: impl Fn(&Rc<ScmRepository>) + 'static) -> Subscription {
        self.state.on_did_add_repository.event(listener)
    }

    pub fn on_did_remove_repository(&self, listener: impl Fn(&Rc<ScmRepository>) + 'static) -> Subscription {
        self.state.on_did_remove_repository.event(listener)
    }

    pub fn on_did_change_selected_repository(
        &self,
        listener: impl Fn(&Option<Rc<ScmRepository>>) + 'static,
    ) -> Subscription {
        self.state.on_did_change_selected_repository.event(listener)
    }

    /// Closes the service's own channels. Registered repositories are left
    /// alone; whoever holds them stays responsible for disposing them.
    pub fn dispose(&self) {
        self.state.on_did_add_repository.dispose();
        self.state.on_did_remove_repository.dispose();
        self.state.on_did_change_selected_repository.dispose();
        debug!(repositories = self.len(), "SCM service disposed");
    }
}

impl Default for ScmService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScmService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmService")
            .field("repositories", &*self.state.repositories.borrow())
            .field(
                "selected",
                &self.state.selected.borrow().as_deref().map(ScmRepository::id),
            )
            .finish()
    }
}
