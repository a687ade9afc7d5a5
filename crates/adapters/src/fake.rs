// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A call-logging fake `OsAdapter`, for `align-engine`/`align-daemon`
//! integration tests that need to assert *which* corrections were applied
//! and in what order, not just the resulting state.
//!
//! `align_core::test_support::FakeOs` covers unit tests inside `align-core`
//! itself; this one additionally records every mutating call so a test can
//! assert not just the resulting state but which operations ran and in
//! what order.

use align_core::{FileStat, OsError, UserDetails};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CreateEmpty(PathBuf),
    Chmod(PathBuf, u32),
    Chown(PathBuf, Option<u32>, Option<u32>),
    CreateUser {
        name: String,
        uid: u32,
        gid: u32,
        groups: Vec<String>,
    },
    SetUid(String, u32),
    SetGid(String, u32),
    SetGroups(String, Vec<String>),
}

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, FileStat>,
    users: HashMap<String, UserDetails>,
    groups: HashMap<String, u32>,
    calls: Vec<FakeCall>,
}

/// A fake `OsAdapter` that records every mutation.
#[derive(Clone, Default)]
pub struct FakeOsAdapter {
    inner: Arc<Mutex<State>>,
}

impl FakeOsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, path: impl Into<PathBuf>, mode: u32, uid: u32, gid: u32) {
        self.inner
            .lock()
            .files
            .insert(path.into(), FileStat { mode, uid, gid });
    }

    pub fn seed_user(&self, name: impl Into<String>, uid: u32, gid: u32, group_ids: Vec<u32>) {
        self.inner.lock().users.insert(
            name.into(),
            UserDetails {
                uid,
                gid,
                group_ids,
            },
        );
    }

    pub fn seed_group(&self, name: impl Into<String>, gid: u32) {
        self.inner.lock().groups.insert(name.into(), gid);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl align_core::StatAdapter for FakeOsAdapter {
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, OsError> {
        Ok(self.inner.lock().files.get(path).copied())
    }
}

#[async_trait]
impl align_core::FsMutator for FakeOsAdapter {
    async fn create_empty(&self, path: &Path) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::CreateEmpty(path.to_path_buf()));
        state
            .files
            .entry(path.to_path_buf())
            .or_insert(FileStat {
                mode: 0o644,
                uid: 0,
                gid: 0,
            });
        Ok(())
    }

    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::Chmod(path.to_path_buf(), mode));
        if let Some(stat) = state.files.get_mut(path) {
            stat.mode = mode;
        }
        Ok(())
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::Chown(path.to_path_buf(), uid, gid));
        if let Some(stat) = state.files.get_mut(path) {
            if let Some(uid) = uid {
                stat.uid = uid;
            }
            if let Some(gid) = gid {
                stat.gid = gid;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl align_core::UserDirectory for FakeOsAdapter {
    async fn lookup_user(&self, name: &str) -> Result<Option<UserDetails>, OsError> {
        Ok(self.inner.lock().users.get(name).cloned())
    }

    async fn lookup_group(&self, name: &str) -> Result<Option<u32>, OsError> {
        Ok(self.inner.lock().groups.get(name).copied())
    }

    async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, OsError> {
        Ok(self
            .inner
            .lock()
            .users
            .iter()
            .find(|(_, d)| d.uid == uid)
            .map(|(name, _)| name.clone()))
    }

    async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, OsError> {
        Ok(self
            .inner
            .lock()
            .groups
            .iter()
            .find(|(_, g)| **g == gid)
            .map(|(name, _)| name.clone()))
    }
}

#[async_trait]
impl align_core::UserMutator for FakeOsAdapter {
    async fn create_user(
        &self,
        name: &str,
        uid: u32,
        gid: u32,
        groups: &[String],
    ) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::CreateUser {
            name: name.to_string(),
            uid,
            gid,
            groups: groups.to_vec(),
        });
        let group_ids = groups
            .iter()
            .filter_map(|g| state.groups.get(g).copied())
            .collect();
        state.users.insert(
            name.to_string(),
            UserDetails {
                uid,
                gid,
                group_ids,
            },
        );
        Ok(())
    }

    async fn set_uid(&self, name: &str, uid: u32) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::SetUid(name.to_string(), uid));
        if let Some(user) = state.users.get_mut(name) {
            user.uid = uid;
        }
        Ok(())
    }

    async fn set_gid(&self, name: &str, gid: u32) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state.calls.push(FakeCall::SetGid(name.to_string(), gid));
        if let Some(user) = state.users.get_mut(name) {
            user.gid = gid;
        }
        Ok(())
    }

    async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), OsError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(FakeCall::SetGroups(name.to_string(), groups.to_vec()));
        let group_ids = groups
            .iter()
            .filter_map(|g| state.groups.get(g).copied())
            .collect();
        if let Some(user) = state.users.get_mut(name) {
            user.group_ids = group_ids;
        }
        Ok(())
    }
}

impl align_core::FsWatchAdapter for FakeOsAdapter {
    fn watch(&self, _path: &Path) -> Result<align_core::FsWatch, OsError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(align_core::FsWatch::new(rx, Box::new(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use align_core::{FsMutator, StatAdapter};

    #[tokio::test]
    async fn create_then_chmod_is_recorded_in_order() {
        let os = FakeOsAdapter::new();
        let path = PathBuf::from("/etc/align/example");

        os.create_empty(&path).await.unwrap();
        os.chmod(&path, 0o600).await.unwrap();

        assert_eq!(
            os.calls(),
            vec![
                FakeCall::CreateEmpty(path.clone()),
                FakeCall::Chmod(path.clone(), 0o600),
            ]
        );
        assert_eq!(os.stat(&path).await.unwrap().unwrap().mode, 0o600);
    }
}
