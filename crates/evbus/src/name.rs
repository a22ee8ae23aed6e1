#![forbid(unsafe_code)]

//! Canonical event-name keys.
//!
//! Symbolic and textual identifiers collapse to one canonical string form:
//! `"tick"`, `String::from("tick")`, and a `char` tag are all usable as
//! registry keys and compare equal when their canonical forms match.
//! `EventName` implements `Borrow<str>`, so registry lookups work from a
//! borrowed `&str` without allocating.

use std::borrow::Borrow;
use std::fmt;

/// Canonical string key identifying a channel of notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Box<str>);

impl EventName {
    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventName {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for EventName {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<char> for EventName {
    fn from(value: char) -> Self {
        Self(value.to_string().into_boxed_str())
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
