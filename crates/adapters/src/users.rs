// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real user-database primitives for the `User` resource: lookups via
//! `nix`, mutations by shelling out to `useradd`/`usermod` — there is no
//! safe syscall surface for editing `/etc/passwd` directly, so mutation
//! drives a real external command instead.

use align_core::{OsError, UserDetails};
use async_trait::async_trait;
use nix::unistd::{Gid, Group, Uid, User};
use std::ffi::CString;
use thiserror::Error;
use tokio::process::Command;

/// Why a shelled-out `useradd`/`usermod` invocation failed, before it gets
/// folded into an [`OsError::UserCreate`]/[`OsError::UserModify`] message.
#[derive(Debug, Error)]
enum ShellError {
    #[error("failed to spawn {0}: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("{0} exited with a failure status: {1}")]
    NonZeroExit(String, String),
}

#[derive(Clone, Copy, Default)]
pub struct RealUsers;

impl RealUsers {
    pub fn new() -> Self {
        Self
    }
}

fn group_ids(name: &str, primary: Gid) -> Vec<u32> {
    let Ok(cname) = CString::new(name) else {
        return vec![primary.as_raw()];
    };
    nix::unistd::getgrouplist(&cname, primary)
        .map(|gids| gids.into_iter().map(Gid::as_raw).collect())
        .unwrap_or_else(|_| vec![primary.as_raw()])
}

async fn run(cmd: &str, args: &[String]) -> Result<(), String> {
    tracing::debug!(cmd, ?args, "shelling out");
    let output = Command::new(cmd)
        .args(args)
        .output()
        .await
        .map_err(|e| ShellError::Spawn(cmd.to_string(), e).to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Err(ShellError::NonZeroExit(cmd.to_string(), stderr).to_string())
    }
}

#[async_trait]
impl align_core::UserDirectory for RealUsers {
    async fn lookup_user(&self, name: &str) -> Result<Option<UserDetails>, OsError> {
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            User::from_name(&name)
                .map_err(|errno| {
                    OsError::UserLookup(name.clone(), std::io::Error::from(errno).to_string())
                })
                .map(|maybe| {
                    maybe.map(|user| UserDetails {
                        uid: user.uid.as_raw(),
                        gid: user.gid.as_raw(),
                        group_ids: group_ids(&name, user.gid),
                    })
                })
        })
        .await
        .unwrap_or_else(|e| Err(OsError::UserLookup(String::new(), e.to_string())))
    }

    async fn lookup_group(&self, name: &str) -> Result<Option<u32>, OsError> {
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            Group::from_name(&name)
                .map_err(|errno| {
                    OsError::GroupLookup(name.clone(), std::io::Error::from(errno).to_string())
                })
                .map(|maybe| maybe.map(|g| g.gid.as_raw()))
        })
        .await
        .unwrap_or_else(|e| Err(OsError::GroupLookup(String::new(), e.to_string())))
    }

    async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, OsError> {
        tokio::task::spawn_blocking(move || {
            User::from_uid(Uid::from_raw(uid))
                .map_err(|errno| OsError::UidLookup(uid, std::io::Error::from(errno).to_string()))
                .map(|maybe| maybe.map(|u| u.name))
        })
        .await
        .unwrap_or_else(|e| Err(OsError::UidLookup(uid, e.to_string())))
    }

    async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, OsError> {
        tokio::task::spawn_blocking(move || {
            Group::from_gid(Gid::from_raw(gid))
                .map_err(|errno| OsError::GidLookup(gid, std::io::Error::from(errno).to_string()))
                .map(|maybe| maybe.map(|g| g.name))
        })
        .await
        .unwrap_or_else(|e| Err(OsError::GidLookup(gid, e.to_string())))
    }
}

#[async_trait]
impl align_core::UserMutator for RealUsers {
    async fn create_user(
        &self,
        name: &str,
        uid: u32,
        gid: u32,
        groups: &[String],
    ) -> Result<(), OsError> {
        let mut args = vec![
            "-u".to_string(),
            uid.to_string(),
            "-g".to_string(),
            gid.to_string(),
            "-M".to_string(),
        ];
        if !groups.is_empty() {
            args.push("-G".to_string());
            args.push(groups.join(","));
        }
        args.push(name.to_string());

        run("useradd", &args)
            .await
            .map_err(|message| OsError::UserCreate {
                name: name.to_string(),
                message,
            })
    }

    async fn set_uid(&self, name: &str, uid: u32) -> Result<(), OsError> {
        run("usermod", &["-u".to_string(), uid.to_string(), name.to_string()])
            .await
            .map_err(|message| OsError::UserModify {
                name: name.to_string(),
                message,
            })
    }

    async fn set_gid(&self, name: &str, gid: u32) -> Result<(), OsError> {
        run("usermod", &["-g".to_string(), gid.to_string(), name.to_string()])
            .await
            .map_err(|message| OsError::UserModify {
                name: name.to_string(),
                message,
            })
    }

    async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), OsError> {
        run(
            "usermod",
            &["-G".to_string(), groups.join(","), name.to_string()],
        )
        .await
        .map_err(|message| OsError::UserModify {
            name: name.to_string(),
            message,
        })
    }
}
