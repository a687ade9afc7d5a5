// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Present/absent distinction for attributes the agent may or may not enforce.

/// Either *unspecified* (the agent does not care) or *specified with value
/// `T`* (the agent enforces it).
///
/// Backed by `Option<T>` so it behaves like ordinary Rust code everywhere
/// except at its two accessors, which mirror the present/absent wrapper
/// resources are checked against: `ok()` reports presence and `value()`
/// returns the zero value of `T` when absent instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optional<T>(Option<T>);

impl<T> Optional<T> {
    pub fn some(value: T) -> Self {
        Self(Some(value))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn ok(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_option(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_option(self) -> Option<T> {
        self.0
    }
}

impl<T: Default + Clone> Optional<T> {
    /// The enforced value, or `T::default()` when unspecified.
    pub fn value(&self) -> T {
        self.0.clone().unwrap_or_default()
    }
}

impl<T> Default for Optional<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}
