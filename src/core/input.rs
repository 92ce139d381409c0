use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::config::InputSettings;
use crate::core::event::{Emitter, Subscription};

/// How serious a validation message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    #[serde(rename = "info", alias = "information")]
    Information,
    Success,
    Warning,
    Error,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Information => write!(f, "info"),
            ValidationSeverity::Success => write!(f, "success"),
            ValidationSeverity::Warning => write!(f, "warning"),
            ValidationSeverity::Error => write!(f, "error"),
        }
    }
}

/// Feedback a validator attaches to the current input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub message: String,
    pub severity: ValidationSeverity,
}

impl ValidationResult {
    pub fn new(message: impl Into<String>, severity: ValidationSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Structural equality over optional results: two absent results are equal,
/// an absent and a present one never are.
pub fn validation_results_equal(a: Option<&ValidationResult>, b: Option<&ValidationResult>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.message == b.message && a.severity == b.severity,
        _ => false,
    }
}

/// Caller-supplied asynchronous check of the input text. `None` means there
/// is nothing to show. The input model only holds it; callers invoke it.
pub type InputValidator = Rc<dyn Fn(&str) -> LocalBoxFuture<'static, Option<ValidationResult>>>;

/// The validator every input starts with: always resolves to `None`.
pub fn no_op_validator() -> InputValidator {
    Rc::new(|_: &str| future::ready(None::<ValidationResult>).boxed_local())
}

struct InputState {
    value: String,
    placeholder: String,
    visible: bool,
    validator: InputValidator,
}

/// Per-repository text input (commit message box) and its change channels.
pub struct ScmInput {
    state: RefCell<InputState>,
    on_did_change: Emitter<String>,
    on_did_change_placeholder: Emitter<String>,
    on_did_change_visibility: Emitter<bool>,
    on_did_change_validator: Emitter<()>,
}

impl ScmInput {
    pub fn new() -> Self {
        Self::with_settings(&InputSettings::default())
    }

    pub fn with_settings(settings: &InputSettings) -> Self {
        Self {
            state: RefCell::new(InputState {
                value: String::new(),
                placeholder: settings.default_placeholder.clone(),
                visible: settings.visible,
                validator: no_op_validator(),
            }),
            on_did_change: Emitter::new(),
            on_did_change_placeholder: Emitter::new(),
            on_did_change_visibility: Emitter::new(),
            on_did_change_validator: Emitter::new(),
        }
    }

    pub fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    /// Replaces the text. Setting the exact same text is a no-op and does not notify.
    pub fn set_value(&self, value: impl Into<String>) {
        let value = value.into();
        {
            let mut state = self.state.borrow_mut();
            if state.value == value {
                return;
            }
            state.value.clone_from(&value);
        }
        self.on_did_change.fire(&value);
    }

    pub fn placeholder(&self) -> String {
        self.state.borrow().placeholder.clone()
    }

    /// Always notifies, even when the placeholder is unchanged.
    pub fn set_placeholder(&self, placeholder: impl Into<String>) {
        let placeholder = placeholder.into();
        self.state.borrow_mut().placeholder.clone_from(&placeholder);
        self.on_did_change_placeholder.fire(&placeholder);
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// Always notifies, even when visibility is unchanged.
    pub fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
        self.on_did_change_visibility.fire(&visible);
    }

    pub fn validator(&self) -> InputValidator {
        Rc::clone(&self.state.borrow().validator)
    }

    pub fn set_validator(&self, validator: InputValidator) {
        self.state.borrow_mut().validator = validator;
        self.on_did_change_validator.fire(&());
    }

    pub fn on_did_change(&self, listener: impl Fn(&String) + 'static) -> Subscription {
        self.on_did_change.event(listener)
    }

    pub fn on_did_change_placeholder(&self, listener: impl Fn(&String) + 'static) -> Subscription {
        self.on_did_change_placeholder.event(listener)
    }

    pub fn on_did_change_visibility(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.on_did_change_visibility.event(listener)
    }

    pub fn on_did_change_validator(&self, listener: impl Fn(&()) + 'static) -> Subscription {
        self.on_did_change_validator.event(listener)
    }
}

impl Default for ScmInput {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScmInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScmInput")
            .field("value", &state.value)
            .field("placeholder", &state.placeholder)
            .field("visible", &state.visible)
            .finish_non_exhaustive()
    }
}
