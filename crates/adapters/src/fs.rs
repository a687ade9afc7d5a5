// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real filesystem primitives for the `File` resource: `stat`, create,
//! `chmod`, `chown`.

use align_core::{FileStat, OsError};
use async_trait::async_trait;
use nix::sys::stat::{fchmodat, FchmodatFlags, Mode};
use nix::unistd::{chown, Gid, Uid};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

#[derive(Clone, Copy, Default)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl align_core::StatAdapter for RealFs {
    async fn stat(&self, path: &Path) -> Result<Option<FileStat>, OsError> {
        tracing::debug!(path = %path.display(), "stat");
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || match std::fs::metadata(&path) {
            Ok(meta) => Ok(Some(FileStat {
                mode: meta.permissions().mode() & 0o7777,
                uid: meta_uid(&meta),
                gid: meta_gid(&meta),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OsError::Stat {
                path: path.display().to_string(),
                source: e,
            }),
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(OsError::Stat {
                path: String::new(),
                source: std::io::Error::other(join_err),
            })
        })
    }
}

#[cfg(unix)]
fn meta_uid(meta: &std::fs::Metadata) -> u32 {
    std::os::unix::fs::MetadataExt::uid(meta)
}

#[cfg(unix)]
fn meta_gid(meta: &std::fs::Metadata) -> u32 {
    std::os::unix::fs::MetadataExt::gid(meta)
}

#[async_trait]
impl align_core::FsMutator for RealFs {
    async fn create_empty(&self, path: &Path) -> Result<(), OsError> {
        tracing::debug!(path = %path.display(), "create_empty");
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map(|_| ())
                .map_err(|e| OsError::Create {
                    path: path.display().to_string(),
                    source: e,
                })
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(OsError::Create {
                path: String::new(),
                source: std::io::Error::other(join_err),
            })
        })
    }

    async fn chmod(&self, path: &Path, mode: u32) -> Result<(), OsError> {
        tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "chmod");
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mode = Mode::from_bits_truncate(mode);
            fchmodat(None, &path, mode, FchmodatFlags::FollowSymlink).map_err(|errno| {
                OsError::Chmod {
                    path: path.display().to_string(),
                    source: std::io::Error::from(errno),
                }
            })
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(OsError::Chmod {
                path: String::new(),
                source: std::io::Error::other(join_err),
            })
        })
    }

    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), OsError> {
        tracing::debug!(path = %path.display(), ?uid, ?gid, "chown");
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            chown(&path, uid.map(Uid::from_raw), gid.map(Gid::from_raw)).map_err(|errno| {
                OsError::Chown {
                    path: path.display().to_string(),
                    source: std::io::Error::from(errno),
                }
            })
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(OsError::Chown {
                path: String::new(),
                source: std::io::Error::other(join_err),
            })
        })
    }
}
