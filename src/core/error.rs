use thiserror::Error;

/// Errors raised by [`crate::core::service::ScmService`].
///
/// Both are programmer errors: the registry is left untouched when one is
/// returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScmError {
    /// A provider with this id is already registered.
    #[error("SCM provider '{id}' is already registered")]
    DuplicateProvider { id: String },
    /// Providers must carry a non-empty id.
    #[error("SCM provider id must not be empty (label: '{label}')")]
    InvalidProviderId { label: String },
}
