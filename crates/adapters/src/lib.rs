// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Concrete `align-core::OsAdapter` implementations: the real one (stdlib +
//! `nix` + external `useradd`/`usermod`), and a fake one for tests that need
//! a call log richer than `align_core::test_support::FakeOs`.

mod fs;
mod users;
mod watch;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use fs::RealFs;
pub use users::RealUsers;
pub use watch::RealWatch;

use align_core::OsAdapter;

/// The production `OsAdapter`: real filesystem, real user database, real
/// fsnotify watches.
#[derive(Clone, Default)]
pub struct RealOs {
    fs: RealFs,
    users: RealUsers,
    watch: RealWatch,
}

impl RealOs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OsAdapter for RealOs {}

#[async_trait::async_trait]
impl align_core::StatAdapter for RealOs {
    async fn stat(
        &self,
        path: &std::path::Path,
    ) -> Result<Option<align_core::FileStat>, align_core::OsError> {
        self.fs.stat(path).await
    }
}

#[async_trait::async_trait]
impl align_core::FsMutator for RealOs {
    async fn create_empty(&self, path: &std::path::Path) -> Result<(), align_core::OsError> {
        self.fs.create_empty(path).await
    }
    async fn chmod(&self, path: &std::path::Path, mode: u32) -> Result<(), align_core::OsError> {
        self.fs.chmod(path, mode).await
    }
    async fn chown(
        &self,
        path: &std::path::Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), align_core::OsError> {
        self.fs.chown(path, uid, gid).await
    }
}

#[async_trait::async_trait]
impl align_core::UserDirectory for RealOs {
    async fn lookup_user(
        &self,
        name: &str,
    ) -> Result<Option<align_core::UserDetails>, align_core::OsError> {
        self.users.lookup_user(name).await
    }
    async fn lookup_group(&self, name: &str) -> Result<Option<u32>, align_core::OsError> {
        self.users.lookup_group(name).await
    }
    async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, align_core::OsError> {
        self.users.lookup_uid(uid).await
    }
    async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, align_core::OsError> {
        self.users.lookup_gid(gid).await
    }
}

#[async_trait::async_trait]
impl align_core::UserMutator for RealOs {
    async fn create_user(
        &self,
        name: &str,
        uid: u32,
        gid: u32,
        groups: &[String],
    ) -> Result<(), align_core::OsError> {
        self.users.create_user(name, uid, gid, groups).await
    }
    async fn set_uid(&self, name: &str, uid: u32) -> Result<(), align_core::OsError> {
        self.users.set_uid(name, uid).await
    }
    async fn set_gid(&self, name: &str, gid: u32) -> Result<(), align_core::OsError> {
        self.users.set_gid(name, gid).await
    }
    async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), align_core::OsError> {
        self.users.set_groups(name, groups).await
    }
}

impl align_core::FsWatchAdapter for RealOs {
    fn watch(&self, path: &std::path::Path) -> Result<align_core::FsWatch, align_core::OsError> {
        self.watch.watch(path)
    }
}
