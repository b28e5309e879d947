//! Typed event hook registry.
//!
//! Each executor variant declares an event type implementing [`HookEvent`]
//! and the set of event kinds its registry accepts. Handlers are invoked
//! synchronously, in registration order, on the dispatching thread.
//!
//! # Failure isolation
//!
//! A handler that returns an error or panics does not stop later handlers
//! for the same event. All failures are collected and returned together
//! from [`HookRegistry::dispatch`] once every handler has run.
//!
//! # Concurrency
//!
//! The registry is `Send + Sync` and is meant to be shared behind an `Arc`
//! by concurrent per-host tasks. Dispatch snapshots the handler list before
//! invoking anything, so handlers may register or unregister hooks without
//! deadlocking.

use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// An event that can be dispatched through a [`HookRegistry`].
pub trait HookEvent: Send + Sync + 'static {
    /// Payload-free discriminator of the event.
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// The kind of this event.
    fn kind(&self) -> Self::Kind;

    /// Look up a kind by its hook name (e.g. `on_start`).
    fn kind_from_name(name: &str) -> Option<Self::Kind>;
}

/// Handle returned by [`HookRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{}", self.0)
    }
}

/// Error returned by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookFailure(pub String);

impl HookFailure {
    /// Create a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for HookFailure {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HookFailure {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// No event kind has this name.
    #[error("unknown hook event: {0}")]
    UnknownEvent(String),

    /// The event kind exists but this registry does not accept it.
    #[error("hook event {0} is not supported here")]
    UnsupportedEvent(String),
}

/// One failed handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Handler that failed.
    pub hook: HookId,
    /// Error message, or the panic message if the handler panicked.
    pub message: String,
}

/// Failures collected from one dispatch, surfaced after all handlers ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} handler(s) failed for {event}", .failures.len())]
pub struct DispatchError {
    /// Name of the dispatched event.
    pub event: String,
    /// Failed handlers, in registration order.
    pub failures: Vec<HandlerFailure>,
}

type Handler<E> = Arc<dyn Fn(&E) -> Result<(), HookFailure> + Send + Sync>;

/// Registry mapping event kinds to ordered handler lists.
pub struct HookRegistry<E: HookEvent> {
    supported: Vec<E::Kind>,
    handlers: DashMap<E::Kind, Vec<(HookId, Handler<E>)>>,
    next_id: AtomicU64,
}

impl<E: HookEvent> HookRegistry<E> {
    /// Create a registry accepting exactly the given kinds.
    pub fn new(supported: &[E::Kind]) -> Self {
        Self {
            supported: supported.to_vec(),
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Kinds this registry accepts.
    pub fn supported(&self) -> &[E::Kind] {
        &self.supported
    }

    /// Returns true if handlers may be registered for `kind`.
    pub fn supports(&self, kind: E::Kind) -> bool {
        self.supported.contains(&kind)
    }

    /// Register a handler for `kind`.
    ///
    /// # Errors
    ///
    /// [`HookError::UnsupportedEvent`] if `kind` is outside the declared set.
    pub fn register<F>(&self, kind: E::Kind, handler: F) -> Result<HookId, HookError>
    where
        F: Fn(&E) -> Result<(), HookFailure> + Send + Sync + 'static,
    {
        if !self.supports(kind) {
            return Err(HookError::UnsupportedEvent(kind.to_string()));
        }
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        Ok(id)
    }

    /// Register a handler by hook name, e.g. `on_target_failed`.
    ///
    /// # Errors
    ///
    /// [`HookError::UnknownEvent`] if no kind has this name, or
    /// [`HookError::UnsupportedEvent`] if this registry does not accept it.
    pub fn register_named<F>(&self, name: &str, handler: F) -> Result<HookId, HookError>
    where
        F: Fn(&E) -> Result<(), HookFailure> + Send + Sync + 'static,
    {
        let kind = E::kind_from_name(name).ok_or_else(|| HookError::UnknownEvent(name.to_string()))?;
        self.register(kind, handler)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        for mut entry in self.handlers.iter_mut() {
            let handlers = entry.value_mut();
            if let Some(pos) = handlers.iter().position(|(hook, _)| *hook == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map(|h| h.len()).unwrap_or(0)
    }

    /// Invoke every handler registered for the event's kind, in order.
    ///
    /// # Errors
    ///
    /// A [`DispatchError`] listing every handler that failed or panicked.
    /// It is returned only after all handlers have run.
    pub fn dispatch(&self, event: &E) -> Result<(), DispatchError> {
        let kind = event.kind();
        let handlers: Vec<(HookId, Handler<E>)> = self
            .handlers
            .get(&kind)
            .map(|h| h.value().clone())
            .unwrap_or_default();

        let mut failures = Vec::new();
        for (hook, handler) in handlers {
            let message = match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => continue,
                Ok(Err(failure)) => failure.0,
                Err(payload) => format!("handler panicked: {}", panic_message(payload.as_ref())),
            };
            failures.push(HandlerFailure { hook, message });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                event: kind.to_string(),
                failures,
            })
        }
    }
}

impl<E: HookEvent> fmt::Debug for HookRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(E::Kind, usize)> = self
            .supported
            .iter()
            .map(|kind| (*kind, self.handler_count(*kind)))
            .collect();
        f.debug_struct("HookRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
