//! Single-threaded publish/subscribe channels.
//!
//! Every observable piece of state in the registry (input fields, repository
//! focus and selection, the registry's own structure) exposes one [`Emitter`]
//! per channel. Delivery is synchronous and happens in the stack of the call
//! that triggered it, in subscription order.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct EmitterState<T> {
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
    disposed: bool,
}

/// One notification channel carrying payloads of type `T`.
///
/// Listeners may re-enter the emitter (fire, subscribe, unsubscribe, dispose)
/// while a delivery is in progress. A single `fire` delivers to the listeners
/// that were subscribed when it started.
pub struct Emitter<T> {
    state: Rc<RefCell<EmitterState<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(EmitterState {
                listeners: Vec::new(),
                next_id: 0,
                disposed: false,
            })),
        }
    }

    /// Subscribes `listener` and returns the handle that removes it again.
    ///
    /// Subscribing to a disposed emitter returns an inert handle and the
    /// listener is never called.
    pub fn event(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let listener: Listener<T> = Rc::new(listener);
        let id = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return Subscription::inert();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, listener));
            id
        };

        let weak: Weak<RefCell<EmitterState<T>>> = Rc::downgrade(&self.state);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    pub fn fire(&self, value: &T) {
        // Snapshot so listeners can touch this emitter without a double borrow.
        let listeners: Vec<Listener<T>> = {
            let state = self.state.borrow();
            if state.disposed {
                return;
            }
            state.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };

        for listener in listeners {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Closes the channel: drops every listener, turns `fire` into a no-op.
    pub fn dispose(&self) {
        let dropped = {
            let mut state = self.state.borrow_mut();
            state.disposed = true;
            std::mem::take(&mut state.listeners)
        };
        // Listener closures may own other emitters; drop them outside the borrow.
        drop(dropped);
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Emitter")
            .field("listeners", &state.listeners.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

/// Handle returned by [`Emitter::event`].
///
/// Dropping the handle keeps the listener subscribed; call
/// [`Subscription::dispose`] to remove it. Disposing after the emitter is gone
/// is a no-op.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn inert() -> Self {
        Self { unsubscribe: None }
    }

    pub fn dispose(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
