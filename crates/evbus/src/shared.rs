#![forbid(unsafe_code)]

//! Thread-safe rendition of the dynamic registry.
//!
//! # Design
//!
//! [`SharedRegistry`] keeps the mapping behind a single mutex
//! (`Arc<Mutex<..>>`); handles clone the `Arc`. Every operation is one
//! lock acquisition. `emit` holds the lock only while snapshotting the
//! listener list and releases it before invoking anything, so a listener
//! that calls back into the same registry (register, remove, re-emit)
//! cannot deadlock.
//!
//! Dispatch is still fully synchronous on the emitting thread: nothing is
//! queued or scheduled, and a listener that never returns blocks that
//! thread. Listener panics happen outside the lock, so they unwind
//! through `emit` without poisoning the mapping.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::name::EventName;

/// A registered callback for the shared registry. Must be `Send + Sync`
/// because any handle-holding thread may invoke it via `emit`.
pub type SharedListener = Arc<dyn Fn(&[&dyn Any]) + Send + Sync>;

/// Wrap a closure as a [`SharedListener`].
#[must_use]
pub fn shared_listener(f: impl Fn(&[&dyn Any]) + Send + Sync + 'static) -> SharedListener {
    Arc::new(f)
}

/// Mutex-guarded registry of ordered listener lists, sharable across
/// threads. Semantics match [`crate::registry::EventRegistry`]:
/// registration order, snapshot dispatch, identity-based removal,
/// silent no-ops on unknown names.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<HashMap<EventName, Vec<SharedListener>>>>,
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SharedRegistry")
            .field("events", &inner.len())
            .field("listeners", &inner.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl SharedRegistry {
    /// Create an empty registry with an independent mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventName, Vec<SharedListener>>> {
        // Mutators run under the lock but never call user code, so the
        // only poisoning source is a panicking assertion in this module.
        self.inner.lock().expect("listener table lock poisoned")
    }

    /// Append `listener` to the list for `name`, creating the list if
    /// absent. No de-duplication. Returns the registry for chaining.
    pub fn on(&self, name: impl Into<EventName>, listener: SharedListener) -> &Self {
        let name = name.into();
        #[cfg(feature = "tracing")]
        tracing::trace!(event = %name, "listener registered");
        self.lock().entry(name).or_default().push(listener);
        self
    }

    /// Synchronously invoke every listener registered for `name` on the
    /// calling thread, in registration order, passing `args` positionally.
    ///
    /// The snapshot is taken under the lock; the lock is released before
    /// the first invocation. Concurrent or re-entrant mutations therefore
    /// affect future emits only. Returns `true` if at least one listener
    /// was registered for `name` when the snapshot was taken.
    pub fn emit(&self, name: impl AsRef<str>, args: &[&dyn Any]) -> bool {
        let name = name.as_ref();
        let snapshot: Vec<SharedListener> = {
            let inner = self.lock();
            match inner.get(name) {
                Some(list) if !list.is_empty() => list.clone(),
                _ => return false,
            }
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(event = name, listeners = snapshot.len(), "emit");
        for callback in &snapshot {
            callback(args);
        }
        true
    }

    /// Remove the first occurrence of `listener` under `name`, matched by
    /// pointer identity. Unknown names and absent listeners are silent
    /// no-ops.
    pub fn remove_listener(&self, name: impl AsRef<str>, listener: &SharedListener) -> &Self {
        let mut inner = self.lock();
        if let Some(list) = inner.get_mut(name.as_ref())
            && let Some(index) = list.iter().position(|cb| Arc::ptr_eq(cb, listener))
        {
            list.remove(index);
        }
        self
    }

    /// Replace the list for `name` with an empty list, keeping the key.
    /// Unknown names are silent no-ops.
    pub fn remove_all_listeners(&self, name: impl AsRef<str>) -> &Self {
        if let Some(list) = self.lock().get_mut(name.as_ref()) {
            list.clear();
        }
        self
    }

    /// Reset the entire mapping.
    pub fn clear(&self) -> &Self {
        self.lock().clear();
        self
    }

    /// Number of listeners currently registered for `name`.
    #[must_use]
    pub fn listener_count(&self, name: impl AsRef<str>) -> usize {
        self.lock().get(name.as_ref()).map_or(0, Vec::len)
    }

    /// Whether at least one listener is registered for `name`.
    #[must_use]
    pub fn has_listeners(&self, name: impl AsRef<str>) -> bool {
        self.listener_count(name) > 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
