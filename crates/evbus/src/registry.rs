#![forbid(unsafe_code)]

//! Dynamic listener registry with snapshot dispatch.
//!
//! # Design
//!
//! [`EventRegistry`] maps canonical event names to insertion-ordered lists
//! of reference-counted callbacks. State lives in shared storage
//! (`Rc<RefCell<..>>`); cloning a registry handle aliases the same mapping,
//! which is what lets a listener hold a handle to the registry that is
//! currently dispatching to it and re-enter `on`/`remove_listener`/`emit`.
//!
//! Listeners are opaque callables over a positional slice of type-erased
//! arguments. Nothing ties an event name to a signature here; for a
//! compile-time contract use [`crate::typed::TypedRegistry`].
//!
//! # Invariants
//!
//! 1. Listeners for a name are invoked in registration order.
//! 2. Registering the same listener twice yields two invocations per emit.
//! 3. `emit` dispatches against a snapshot taken before the first call:
//!    mutations made by listeners during the cycle affect future emits only.
//! 4. Removal matches by pointer identity (`Rc::ptr_eq`), never by value,
//!    and removes only the first occurrence.
//! 5. Each registry created by [`EventRegistry::new`] owns an independent
//!    mapping; there is no global table.
//!
//! # Failure Modes
//!
//! - **Listener panic**: not caught. The panic unwinds through `emit` and
//!   the remaining snapshot entries are not invoked.
//! - **Unknown event name**: silent no-op on removal, `false` from `emit`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::name::EventName;

/// A registered callback: arbitrary arity via a positional slice of
/// type-erased argument references. Held by reference count so the same
/// value can be both registered and retained by the caller for later
/// identity-based removal.
pub type DynListener = Rc<dyn Fn(&[&dyn Any])>;

/// Wrap a closure as a [`DynListener`].
#[must_use]
pub fn listener(f: impl Fn(&[&dyn Any]) + 'static) -> DynListener {
    Rc::new(f)
}

struct RegistryInner {
    listeners: HashMap<EventName, Vec<DynListener>>,
}

/// String-keyed registry of ordered listener lists with synchronous
/// snapshot dispatch.
///
/// Cloning creates a new handle to the **same** mapping.
///
/// ```
/// use std::rc::Rc;
/// use evbus::{EventRegistry, listener};
///
/// let registry = EventRegistry::new();
/// let greet = listener(|args| {
///     if let Some(who) = args.first().and_then(|a| a.downcast_ref::<&str>()) {
///         println!("hello {who}");
///     }
/// });
/// registry.on("greet", Rc::clone(&greet));
/// assert!(registry.emit("greet", &[&"world"]));
/// assert!(!registry.emit("missing", &[]));
/// registry.remove_listener("greet", &greet);
/// assert!(!registry.emit("greet", &[&"world"]));
/// ```
pub struct EventRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

// Manual Clone: shares the same Rc.
impl Clone for EventRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventRegistry")
            .field("events", &inner.listeners.len())
            .field(
                "listeners",
                &inner.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl EventRegistry {
    /// Create an empty registry with an independent mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                listeners: HashMap::new(),
            })),
        }
    }

    /// Append `listener` to the list for `name`, creating the list if
    /// absent. No de-duplication: registering the same listener twice
    /// yields two invocations per emit.
    ///
    /// Returns the registry for fluent chaining.
    pub fn on(&self, name: impl Into<EventName>, listener: DynListener) -> &Self {
        let name = name.into();
        #[cfg(feature = "tracing")]
        tracing::trace!(event = %name, "listener registered");
        self.inner
            .borrow_mut()
            .listeners
            .entry(name)
            .or_default()
            .push(listener);
        self
    }

    /// Synchronously invoke every listener registered for `name`, in
    /// registration order, passing `args` positionally.
    ///
    /// The listener list is snapshotted before the first invocation, so a
    /// listener that removes a not-yet-invoked peer (or itself) during this
    /// cycle does not change what the cycle dispatches — removal takes
    /// effect on the next emit. Likewise a listener registered during the
    /// cycle is first invoked on the next emit.
    ///
    /// Returns `true` if at least one listener was registered for `name`
    /// when the call was made, `false` otherwise.
    ///
    /// A panicking listener unwinds through this call; the remaining
    /// snapshot entries are not invoked.
    pub fn emit(&self, name: impl AsRef<str>, args: &[&dyn Any]) -> bool {
        let name = name.as_ref();
        // Snapshot under the borrow, invoke after releasing it, so
        // listeners can re-enter the registry.
        let snapshot: Vec<DynListener> = {
            let inner = self.inner.borrow();
            match inner.listeners.get(name) {
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

    /// Remove the first (lowest-index) occurrence of `listener` under
    /// `name`, matched by pointer identity. Unknown names and absent
    /// listeners are silent no-ops.
    pub fn remove_listener(&self, name: impl AsRef<str>, listener: &DynListener) -> &Self {
        let mut inner = self.inner.borrow_mut();
        if let Some(list) = inner.listeners.get_mut(name.as_ref())
            && let Some(index) = list.iter().position(|cb| Rc::ptr_eq(cb, listener))
        {
            list.remove(index);
            #[cfg(feature = "tracing")]
            tracing::trace!(event = name.as_ref(), "listener removed");
        }
        self
    }

    /// Replace the list for `name` with an empty list. The key stays in
    /// the mapping. Unknown names are silent no-ops.
    pub fn remove_all_listeners(&self, name: impl AsRef<str>) -> &Self {
        if let Some(list) = self.inner.borrow_mut().listeners.get_mut(name.as_ref()) {
            list.clear();
        }
        self
    }

    /// Reset the entire mapping: every event name and its list is removed.
    pub fn clear(&self) -> &Self {
        self.inner.borrow_mut().listeners.clear();
        self
    }

    /// Number of listeners currently registered for `name` (zero for
    /// unknown names).
    #[must_use]
    pub fn listener_count(&self, name: impl AsRef<str>) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(name.as_ref())
            .map_or(0, Vec::len)
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
