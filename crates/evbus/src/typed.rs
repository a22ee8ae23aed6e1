#![forbid(unsafe_code)]

//! Statically typed variant: each event name carries its listener
//! signature at the type level.
//!
//! # Design
//!
//! An event is a marker type implementing [`Event`], declaring the
//! canonical name and the argument tuple its listeners receive. `on` only
//! accepts callables over `&E::Args` and `emit` only accepts `&E::Args`,
//! so a call that disagrees with the declared signature for an event fails
//! to compile — the contract is enforced by the type system, not checked
//! at runtime.
//!
//! Internally all event types share one erased list type: each callable is
//! boxed, then reference-counted as `Rc<dyn Any>` (an `Rc<dyn Fn(..)>`
//! cannot coerce to `Rc<dyn Any>` directly, so the box supplies a single
//! concrete payload type to recover with `downcast_ref` during dispatch).
//!
//! Dispatch, snapshot, and removal semantics are identical to
//! [`crate::registry::EventRegistry`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::name::EventName;

/// A statically declared event: a canonical name plus the positional
/// argument tuple its listeners receive.
///
/// ```
/// use evbus::{Event, Listener, TypedRegistry};
///
/// struct Progress;
/// impl Event for Progress {
///     const NAME: &'static str = "progress";
///     type Args = (u32, String);
/// }
///
/// let registry = TypedRegistry::new();
/// let on_progress = Listener::<Progress>::new(|(pct, stage)| {
///     println!("{stage}: {pct}%");
/// });
/// registry.on(&on_progress);
/// assert!(registry.emit::<Progress>(&(40, "indexing".into())));
/// registry.remove_listener(&on_progress);
/// assert!(!registry.emit::<Progress>(&(41, "indexing".into())));
/// ```
pub trait Event: 'static {
    /// Canonical name of the event. Two event types sharing a name share
    /// a listener list.
    const NAME: &'static str;
    /// Positional argument tuple passed to listeners on emit.
    type Args: 'static;
}

/// Handle to a registered callable for event `E`.
///
/// Removal is by identity, so the caller keeps the handle and passes it
/// back to [`TypedRegistry::remove_listener`]. Cloning the handle aliases
/// the same callable; registering a handle and its clone counts as the
/// same listener for removal purposes.
pub struct Listener<E: Event> {
    slot: Rc<dyn Any>,
    _marker: PhantomData<fn(&E::Args)>,
}

impl<E: Event> Listener<E> {
    /// Wrap a callable over `E`'s argument tuple.
    #[must_use]
    pub fn new(f: impl Fn(&E::Args) + 'static) -> Self {
        let boxed: Box<dyn Fn(&E::Args)> = Box::new(f);
        Self {
            slot: Rc::new(boxed),
            _marker: PhantomData,
        }
    }
}

// Manual Clone: shares the same Rc regardless of whether E::Args is Clone.
impl<E: Event> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            _marker: PhantomData,
        }
    }
}

impl<E: Event> std::fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("event", &E::NAME)
            .finish_non_exhaustive()
    }
}

struct TypedInner {
    listeners: HashMap<EventName, Vec<Rc<dyn Any>>>,
}

/// Registry keyed by [`Event`] types, with the same ordered-list,
/// snapshot-dispatch semantics as the dynamic variant.
///
/// Cloning creates a new handle to the **same** mapping.
pub struct TypedRegistry {
    inner: Rc<RefCell<TypedInner>>,
}

// Manual Clone: shares the same Rc.
impl Clone for TypedRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for TypedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TypedRegistry")
            .field("events", &inner.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TypedRegistry {
    /// Create an empty registry with an independent mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TypedInner {
                listeners: HashMap::new(),
            })),
        }
    }

    /// Append the listener to the list for `E::NAME`, creating the list
    /// if absent. No de-duplication. Returns the registry for chaining.
    pub fn on<E: Event>(&self, listener: &Listener<E>) -> &Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(event = E::NAME, "listener registered");
        self.inner
            .borrow_mut()
            .listeners
            .entry(EventName::from(E::NAME))
            .or_default()
            .push(Rc::clone(&listener.slot));
        self
    }

    /// Synchronously invoke every listener for `E`, in registration order,
    /// against a snapshot taken before the first call. Returns `true` if
    /// at least one listener was registered for `E::NAME` at call time.
    ///
    /// A listener registered under the same name through a *different*
    /// event type with a different `Args` tuple stays in the list but is
    /// skipped by the dispatch downcast rather than mis-cast.
    pub fn emit<E: Event>(&self, args: &E::Args) -> bool {
        let snapshot: Vec<Rc<dyn Any>> = {
            let inner = self.inner.borrow();
            match inner.listeners.get(E::NAME) {
                Some(list) if !list.is_empty() => list.clone(),
                _ => return false,
            }
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(event = E::NAME, listeners = snapshot.len(), "emit");
        for slot in &snapshot {
            if let Some(callback) = slot.downcast_ref::<Box<dyn Fn(&E::Args)>>() {
                callback(args);
            }
        }
        true
    }

    /// Remove the first occurrence of the listener under `E::NAME`,
    /// matched by identity. Unknown names and absent listeners are
    /// silent no-ops.
    pub fn remove_listener<E: Event>(&self, listener: &Listener<E>) -> &Self {
        let mut inner = self.inner.borrow_mut();
        if let Some(list) = inner.listeners.get_mut(E::NAME)
            && let Some(index) = list.iter().position(|slot| Rc::ptr_eq(slot, &listener.slot))
        {
            list.remove(index);
        }
        self
    }

    /// Replace the list for `E::NAME` with an empty list, keeping the key.
    pub fn remove_all_listeners<E: Event>(&self) -> &Self {
        if let Some(list) = self.inner.borrow_mut().listeners.get_mut(E::NAME) {
            list.clear();
        }
        self
    }

    /// Reset the entire mapping.
    pub fn clear(&self) -> &Self {
        self.inner.borrow_mut().listeners.clear();
        self
    }

    /// Number of listeners currently registered for `E::NAME`.
    #[must_use]
    pub fn listener_count<E: Event>(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(E::NAME)
            .map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Tick;
    impl Event for Tick {
        const NAME: &'static str = "tick";
        type Args = (u32,);
    }

    struct Resize;
    impl Event for Resize {
        const NAME: &'static str = "resize";
        type Args = (u16, u16);
    }

    // Same name as Tick, different signature.
    struct TickText;
    impl Event for TickText {
        const NAME: &'static str = "tick";
        type Args = (String,);
    }

    #[test]
    fn emit_without_listeners_returns_false() {
        let registry = TypedRegistry::new();
        assert!(!registry.emit::<Tick>(&(1,)));
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let registry = TypedRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = Rc::clone(&log);
            Listener::<Tick>::new(move |_| log.borrow_mut().push('A'))
        };
        let second = {
            let log = Rc::clone(&log);
            Listener::<Tick>::new(move |_| log.borrow_mut().push('B'))
        };

        registry.on(&first).on(&second);

        assert!(registry.emit::<Tick>(&(7,)));
        assert_eq!(*log.borrow(), vec!['A', 'B']);
    }

    #[test]
    fn listener_receives_declared_args() {
        let registry = TypedRegistry::new();
        let seen = Rc::new(Cell::new((0u16, 0u16)));
        let seen_clone = Rc::clone(&seen);

        let on_resize = Listener::<Resize>::new(move |&(w, h)| seen_clone.set((w, h)));
        registry.on(&on_resize);

        registry.emit::<Resize>(&(80, 24));
        assert_eq!(seen.get(), (80, 24));
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        let registry = TypedRegistry::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let cb = Listener::<Tick>::new(move |_| count_clone.set(count_clone.get() + 1));
        registry.on(&cb).on(&cb);

        registry.emit::<Tick>(&(1,));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn remove_listener_by_handle() {
        let registry = TypedRegistry::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let cb = Listener::<Tick>::new(move |_| count_clone.set(count_clone.get() + 1));
        registry.on(&cb);
        registry.remove_listener(&cb);

        assert!(!registry.emit::<Tick>(&(1,)));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn clone_of_handle_is_same_listener_for_removal() {
        let registry = TypedRegistry::new();
        let cb = Listener::<Tick>::new(|_| {});
        let alias = cb.clone();

        registry.on(&cb);
        registry.remove_listener(&alias);

        assert_eq!(registry.listener_count::<Tick>(), 0);
    }

    #[test]
    fn remove_unknown_event_is_noop() {
        let registry = TypedRegistry::new();
        let cb = Listener::<Tick>::new(|_| {});
        registry.remove_listener(&cb);
        assert_eq!(registry.listener_count::<Tick>(), 0);
    }

    #[test]
    fn remove_all_listeners_is_scoped_to_one_event() {
        let registry = TypedRegistry::new();
        let tick = Listener::<Tick>::new(|_| {});
        let resize = Listener::<Resize>::new(|_| {});

        registry.on(&tick).on(&resize);
        registry.remove_all_listeners::<Tick>();

        assert!(!registry.emit::<Tick>(&(1,)));
        assert!(registry.emit::<Resize>(&(80, 24)));
    }

    #[test]
    fn clear_resets_everything() {
        let registry = TypedRegistry::new();
        let tick = Listener::<Tick>::new(|_| {});
        let resize = Listener::<Resize>::new(|_| {});

        registry.on(&tick).on(&resize).clear();

        assert!(!registry.emit::<Tick>(&(1,)));
        assert!(!registry.emit::<Resize>(&(80, 24)));
    }

    #[test]
    fn same_name_different_signature_does_not_cross_invoke() {
        let registry = TypedRegistry::new();
        let numeric = Rc::new(Cell::new(0u32));
        let textual = Rc::new(Cell::new(0u32));

        let numeric_clone = Rc::clone(&numeric);
        let on_tick = Listener::<Tick>::new(move |_| numeric_clone.set(numeric_clone.get() + 1));
        let textual_clone = Rc::clone(&textual);
        let on_text =
            Listener::<TickText>::new(move |_| textual_clone.set(textual_clone.get() + 1));

        registry.on(&on_tick).on(&on_text);

        // Both live under "tick"; only the matching signature runs.
        assert!(registry.emit::<Tick>(&(1,)));
        assert_eq!(numeric.get(), 1);
        assert_eq!(textual.get(), 0);

        assert!(registry.emit::<TickText>(&(String::from("one"),)));
        assert_eq!(numeric.get(), 1);
        assert_eq!(textual.get(), 1);
    }

    #[test]
    fn removal_during_emit_affects_next_cycle_only() {
        let registry = TypedRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let b = {
            let log = Rc::clone(&log);
            Listener::<Tick>::new(move |_| log.borrow_mut().push('B'))
        };
        let a = {
            let log = Rc::clone(&log);
            let registry = registry.clone();
            let b = b.clone();
            Listener::<Tick>::new(move |_| {
                log.borrow_mut().push('A');
                registry.remove_listener(&b);
            })
        };

        registry.on(&a).on(&b);

        assert!(registry.emit::<Tick>(&(1,)));
        assert_eq!(*log.borrow(), vec!['A', 'B']);

        assert!(registry.emit::<Tick>(&(2,)));
        assert_eq!(*log.borrow(), vec!['A', 'B', 'A']);
    }

    #[test]
    fn debug_format() {
        let registry = TypedRegistry::new();
        let cb = Listener::<Tick>::new(|_| {});
        registry.on(&cb);

        assert!(format!("{registry:?}").contains("TypedRegistry"));
        assert!(format!("{cb:?}").contains("tick"));
    }
}
