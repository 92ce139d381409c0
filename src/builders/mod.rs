// This file is the module declaration file for the `builders` module.
// It declares the concrete collaborators that plug into the core registry:
// providers, validators and reporters.

use std::sync::atomic::{AtomicU32, Ordering};

// `git` module:
// A `ScmProvider` backed by a git working tree through `git2`. It exposes the
// staged and unstaged changes as two resource groups.
pub mod git;

// `memory` module:
// A `ScmProvider` whose groups and metadata are set by the host directly.
pub mod memory;

// `reporter` module:
// Builds a serializable `RegistrySnapshot` of a service and prints it through
// the `StatusReporter` trait (`ConsoleReporter`), or renders it as json/yaml/toml.
pub mod reporter;

// `validator` module:
// `StandardValidator` checks the settings file; `RuleValidator` turns the
// configured regex rules into an input validator.
pub mod validator;

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Process-unique provider handle.
pub(crate) fn next_handle() -> u32 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}
