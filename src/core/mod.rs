// The `core` module holds the registry itself and everything it is made of.
//
// `event`: single-threaded publish/subscribe channels (`Emitter`, `Subscription`)
// used for every notification in the crate.
pub mod event;

// `input`: the per-repository input model (value, placeholder, visibility,
// validator) and the `ValidationResult` type validators resolve to.
pub mod input;

// `provider`: the `ScmProvider` capability trait plus resource groups and
// commands that providers expose.
pub mod provider;

// `repository`: `ScmRepository`, the binding of one provider to its input
// model and selection flag.
pub mod repository;

// `service`: `ScmService`, the registry of repositories and the global selection.
pub mod service;

pub mod config;
pub mod error;
