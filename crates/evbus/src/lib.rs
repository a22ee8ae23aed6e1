// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Synchronous publish/subscribe registries with snapshot dispatch.
//!
//! # Role
//! `evbus` maps event names to ordered lists of callback listeners and
//! dispatches to them synchronously, in registration order, on the caller's
//! thread. There is no queue, no scheduler, and no delivery guarantee beyond
//! "each listener in the snapshot runs before `emit` returns".
//!
//! # Variants
//! - [`EventRegistry`]: dynamic, string-keyed. Listeners receive a positional
//!   slice of type-erased arguments; nothing ties an event name to a
//!   signature.
//! - [`TypedRegistry`]: each event is a marker type implementing [`Event`],
//!   carrying its name and argument tuple at the type level. Mismatched
//!   `on`/`emit` calls fail to compile.
//! - [`SharedRegistry`]: the same semantics behind a single mutex, for
//!   registries shared across threads.
//!
//! # Dispatch contract
//! `emit` snapshots the listener list before invoking anything. A listener
//! that mutates the registry mid-cycle (removing itself, removing a peer,
//! registering a new listener) changes only *future* emits — the in-progress
//! cycle always runs the snapshot it started with. Listener panics are not
//! caught; they unwind through `emit` and abort the remainder of the cycle.
//!
//! # Failure Modes
//! - Operations on unknown event names are silent no-ops (`emit` returns
//!   `false`); nothing in the API returns `Result`.
//! - A listener that never returns blocks the calling thread. Inherent to
//!   synchronous dispatch, not worked around.

pub mod name;
pub mod registry;
pub mod shared;
pub mod typed;

pub use name::EventName;
pub use registry::{DynListener, EventRegistry, listener};
pub use shared::{SharedListener, SharedRegistry, shared_listener};
pub use typed::{Event, Listener, TypedRegistry};
