// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fake of [`OsAdapter`], usable without touching a real
//! filesystem or user database. Exercised directly by this crate's own
//! unit tests; `align-adapters` provides a richer fake (with call logs)
//! for `align-engine`/`align-daemon` integration tests.

use crate::adapter::{
    FileStat, FsMutator, FsWatch, FsWatchAdapter, OsError, StatAdapter, UserDetails,
    UserDirectory, UserMutator,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
pub struct FakeOs {
    files: Arc<Mutex<HashMap<PathBuf, FileStat>>>,
    users: Arc<Mutex<HashMap<String, UserDetails>>>,
    groups: Arc<Mutex<HashMap<String, u32>>>,
    usernames: Arc<Mutex<HashMap<u32, String>>>,
    groupnames: Arc<Mutex<HashMap<u32, String>>>,
}

impl FakeOs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, path: &str, mode: u32, owner: &str, group: &str) {
        let uid = self.intern_user(owner);
        let gid = self.intern_group(group);
        self.files
            .lock()
            .insert(PathBuf::from(path), FileStat { mode, uid, gid });
    }

    pub fn seed_user(&self, name: &str, uid: u32, gid: u32, groups: &[&str]) {
        let group_ids = groups.iter().map(|g| self.intern_group(g)).collect();
        self.users.lock().insert(
            name.to_string(),
            UserDetails {
                uid,
                gid,
                group_ids,
            },
        );
    }

    fn intern_user(&self, name: &str) -> u32 {
        let mut usernames = self.usernames.lock();
        if let Some((uid, _)) = usernames.iter().find(|(_, n)| n.as_str() == name) {
            return *uid;
        }
        let uid = 1000 + usernames.len() as u32;
        usernames.insert(uid, name.to_string());
        uid
    }

    fn intern_group(&self, name: &str) -> u32 {
        let mut groupnames = self.groupnames.lock();
        if let Some((gid, _)) = groupnames.iter().find(|(_, n)| n.as_str() == name) {
            return *gid;
        }
        let gid = 2000 + groupnames.len() as u32;
        groupnames.insert(gid, name.to_string());
        self.groups.lock().insert(name.to_string(), gid);
        gid
    }
}

#[async_trait]
impl StatAdapter for FakeOs {
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, OsError> {
        Ok(self.files.lock().get(path).copied())
    }
}

#[async_trait]
impl FsMutator for FakeOs {
    async fn create_empty(&self, path: &Path) -> Result<(), OsError> {
        self.files.lock().entry(path.to_path_buf()).or_insert(FileStat {
            mode: 0o644,
            uid: 0,
            gid: 0,
        });
        Ok(())
    }

    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), OsError> {
        if let Some(stat) = self.files.lock().get_mut(path) {
            stat.mode = mode;
        }
        Ok(())
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), OsError> {
        if let Some(stat) = self.files.lock().get_mut(path) {
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
impl UserDirectory for FakeOs {
    async fn lookup_user(&self, name: &str) -> Result<Option<UserDetails>, OsError> {
        Ok(self.users.lock().get(name).cloned())
    }

    async fn lookup_group(&self, name: &str) -> Result<Option<u32>, OsError> {
        Ok(self.groups.lock().get(name).copied())
    }

    async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, OsError> {
        Ok(self.usernames.lock().get(&uid).cloned())
    }

    async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, OsError> {
        Ok(self.groupnames.lock().get(&gid).cloned())
    }
}

#[async_trait]
impl UserMutator for FakeOs {
    async fn create_user(
        &self,
        name: &str,
        uid: u32,
        gid: u32,
        groups: &[String],
    ) -> Result<(), OsError> {
        let group_ids = groups.iter().map(|g| self.intern_group(g)).collect();
        self.usernames.lock().insert(uid, name.to_string());
        self.users.lock().insert(
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
        if let Some(details) = self.users.lock().get_mut(name) {
            details.uid = uid;
        }
        Ok(())
    }

    async fn set_gid(&self, name: &str, gid: u32) -> Result<(), OsError> {
        if let Some(details) = self.users.lock().get_mut(name) {
            details.gid = gid;
        }
        Ok(())
    }

    async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), OsError> {
        let group_ids = groups.iter().map(|g| self.intern_group(g)).collect();
        if let Some(details) = self.users.lock().get_mut(name) {
            details.group_ids = group_ids;
        }
        Ok(())
    }
}

impl FsWatchAdapter for FakeOs {
    fn watch(&self, _path: &Path) -> Result<FsWatch, OsError> {
        // No real kernel watch in tests; an empty, never-firing channel is
        // enough for unit tests that only exercise `check`/`apply` directly.
        let (_tx, rx) = mpsc::channel(1);
        Ok(FsWatch::new(rx, Box::new(())))
    }
}
