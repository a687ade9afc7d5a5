// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow, mockable interfaces to the OS primitives resources need.
//!
//! Each trait covers exactly one syscall-shaped concern — stat, filesystem
//! mutation, user-database lookup, user-database mutation, filesystem
//! notifications — so resources stay testable without root privileges.
//! Concrete implementations (real syscalls, and fakes for tests) live in
//! `align-adapters`; this crate only defines the seam.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::sync::mpsc;

/// The subset of `stat(2)` resources care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

/// The subset of a user database record resources care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub uid: u32,
    pub gid: u32,
    pub group_ids: Vec<u32>,
}

#[derive(Debug, Error)]
pub enum OsError {
    #[error("failed to stat {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to change mode of {path}: {source}")]
    Chmod {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to change owner/group of {path}: {source}")]
    Chown {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to lookup user {0}: {1}")]
    UserLookup(String, String),
    #[error("failed to lookup group {0}: {1}")]
    GroupLookup(String, String),
    #[error("failed to lookup uid {0}: {1}")]
    UidLookup(u32, String),
    #[error("failed to lookup gid {0}: {1}")]
    GidLookup(u32, String),
    #[error("failed to create user {name}: {message}")]
    UserCreate { name: String, message: String },
    #[error("failed to modify user {name}: {message}")]
    UserModify { name: String, message: String },
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify_error::NotifyError,
    },
}

/// Thin re-export so `align-core` doesn't need to name the `notify` crate
/// directly in its public error type; `align-adapters` fills this in.
pub mod notify_error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("{0}")]
    pub struct NotifyError(pub String);
}

/// `stat(path) -> {mode, uid, gid} | not-exist | error`.
#[async_trait]
pub trait StatAdapter: Send + Sync {
    /// `Ok(None)` means the path does not exist; any other failure is a
    /// hard error and must not be conflated with "absent".
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, OsError>;
}

/// `create-empty(path)`, `chmod(path, mode)`, `chown(path, uid?, gid?)`.
#[async_trait]
pub trait FsMutator: Send + Sync {
    async fn create_empty(&self, path: &Path) -> Result<(), OsError>;
    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), OsError>;
    /// Either side may be `None` to leave that half unchanged.
    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), OsError>;
}

/// `lookup-user`, `lookup-group`, and the uid/gid -> name reverse lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` means "unknown user"; any other failure is a hard error.
    async fn lookup_user(&self, name: &str) -> Result<Option<UserDetails>, OsError>;
    async fn lookup_group(&self, name: &str) -> Result<Option<u32>, OsError>;
    async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, OsError>;
    async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, OsError>;
}

/// `create-user`, `set-user-uid`, `set-user-gid`, `set-user-groups` —
/// canonically `useradd`/`usermod`.
#[async_trait]
pub trait UserMutator: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        uid: u32,
        gid: u32,
        groups: &[String],
    ) -> Result<(), OsError>;
    async fn set_uid(&self, name: &str, uid: u32) -> Result<(), OsError>;
    async fn set_gid(&self, name: &str, gid: u32) -> Result<(), OsError>;
    async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), OsError>;
}

/// A live filesystem watch on a single path. Dropping it stops the watch.
pub struct FsWatch {
    pub events: mpsc::Receiver<()>,
    _guard: Box<dyn std::any::Any + Send>,
}

impl FsWatch {
    pub fn new(events: mpsc::Receiver<()>, guard: Box<dyn std::any::Any + Send>) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }
}

/// `watch(path, op-set) -> stream of events | error`.
///
/// Synchronous by design: installing a kernel watch is not itself an
/// async operation, it just needs to outlive the returned receiver.
pub trait FsWatchAdapter: Send + Sync {
    fn watch(&self, path: &Path) -> Result<FsWatch, OsError>;
}

/// Everything a resource needs from the host, bundled behind one bound so
/// `File<O>`/`User<O>` only need to name a single generic parameter.
pub trait OsAdapter:
    StatAdapter + FsMutator + UserDirectory + UserMutator + FsWatchAdapter + Send + Sync + 'static
{
}

impl<T> OsAdapter for T where
    T: StatAdapter
        + FsMutator
        + UserDirectory
        + UserMutator
        + FsWatchAdapter
        + Send
        + Sync
        + 'static
{
}
