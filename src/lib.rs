//! In-process registry of source-control providers.
//!
//! [`ScmService`] keeps the registered repositories in insertion order,
//! enforces unique provider ids and tracks which repository is selected.
//! Each [`ScmRepository`] owns an [`ScmInput`] whose fields notify
//! subscribers synchronously through [`crate::core::event::Emitter`].
//!
//! ```
//! use scm_registry::{MemoryProvider, ScmService};
//! use std::rc::Rc;
//!
//! let service = ScmService::new();
//! let repository = service.register(Rc::new(MemoryProvider::new("a", "Repo A"))).unwrap();
//! assert!(Rc::ptr_eq(&service.selected_repository().unwrap(), &repository));
//!
//! repository.dispose();
//! assert!(service.repositories().is_empty());
//! ```

pub mod builders;
pub mod core;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::builders::memory::MemoryProvider;
pub use crate::core::error::ScmError;
pub use crate::core::event::{Emitter, Subscription};
pub use crate::core::input::{
    InputValidator, ScmInput, ValidationResult, ValidationSeverity, no_op_validator,
    validation_results_equal,
};
pub use crate::core::provider::{ScmCommand, ScmProvider, ScmResource, ScmResourceGroup};
pub use crate::core::repository::ScmRepository;
pub use crate::core::service::ScmService;
