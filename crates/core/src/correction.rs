// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The correction protocol: a deferred, idempotent unit of repair.
//!
//! Corrections are a tagged variant rather than a boxed closure: this
//! makes every correction nameable and loggable, and testable by matching
//! on the variant instead of comparing function pointers.

use crate::adapter::OsAdapter;
use crate::mode_fmt::format_mode;
use crate::optional::Optional;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("correction failed: {0}")]
pub struct CorrectionError(#[from] pub crate::adapter::OsError);

/// A single repair action. Corrections whose corresponding attribute is
/// unspecified are safe to apply: they no-op instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    CreateFile {
        path: PathBuf,
    },
    Chmod {
        path: PathBuf,
        mode: Optional<u32>,
    },
    ChownOwner {
        path: PathBuf,
        owner: Optional<String>,
    },
    ChownGroup {
        path: PathBuf,
        group: Optional<String>,
    },
    CreateUser {
        name: String,
        uid: u32,
        gid: u32,
        groups: Optional<Vec<String>>,
    },
    SetUid {
        name: String,
        uid: u32,
    },
    SetGid {
        name: String,
        gid: u32,
    },
    SetGroups {
        name: String,
        groups: Optional<Vec<String>>,
    },
}

impl Correction {
    /// Stable name for log spans and test assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Correction::CreateFile { .. } => "create_file",
            Correction::Chmod { .. } => "chmod",
            Correction::ChownOwner { .. } => "chown_owner",
            Correction::ChownGroup { .. } => "chown_group",
            Correction::CreateUser { .. } => "create_user",
            Correction::SetUid { .. } => "set_uid",
            Correction::SetGid { .. } => "set_gid",
            Correction::SetGroups { .. } => "set_groups",
        }
    }

    /// Key-value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Correction::CreateFile { path } => vec![("path", path.display().to_string())],
            Correction::Chmod { path, mode } => vec![
                ("path", path.display().to_string()),
                ("mode", format_mode(mode.value())),
            ],
            Correction::ChownOwner { path, owner } => vec![
                ("path", path.display().to_string()),
                ("owner", owner.value()),
            ],
            Correction::ChownGroup { path, group } => vec![
                ("path", path.display().to_string()),
                ("group", group.value()),
            ],
            Correction::CreateUser { name, uid, gid, .. } => vec![
                ("name", name.clone()),
                ("uid", uid.to_string()),
                ("gid", gid.to_string()),
            ],
            Correction::SetUid { name, uid } => {
                vec![("name", name.clone()), ("uid", uid.to_string())]
            }
            Correction::SetGid { name, gid } => {
                vec![("name", name.clone()), ("gid", gid.to_string())]
            }
            Correction::SetGroups { name, groups } => vec![
                ("name", name.clone()),
                ("groups", groups.value().join(",")),
            ],
        }
    }

    /// Apply this correction against the host. No-ops when the relevant
    /// attribute is unspecified — an absent optional is always inert.
    pub async fn apply<O: OsAdapter>(&self, os: &O) -> Result<(), CorrectionError> {
        match self {
            Correction::CreateFile { path } => {
                os.create_empty(path).await?;
            }
            Correction::Chmod { path, mode } => {
                if let Some(mode) = mode.as_option() {
                    os.chmod(path, *mode).await?;
                }
            }
            Correction::ChownOwner { path, owner } => {
                if let Some(owner) = owner.as_option() {
                    let uid = os
                        .lookup_user(owner)
                        .await?
                        .map(|d| d.uid)
                        .ok_or_else(|| {
                            CorrectionError(crate::adapter::OsError::UserLookup(
                                owner.clone(),
                                "unknown user".to_string(),
                            ))
                        })?;
                    os.chown(path, Some(uid), None).await?;
                }
            }
            Correction::ChownGroup { path, group } => {
                if let Some(group) = group.as_option() {
                    let gid = os.lookup_group(group).await?.ok_or_else(|| {
                        CorrectionError(crate::adapter::OsError::GroupLookup(
                            group.clone(),
                            "unknown group".to_string(),
                        ))
                    })?;
                    os.chown(path, None, Some(gid)).await?;
                }
            }
            Correction::CreateUser {
                name,
                uid,
                gid,
                groups,
            } => {
                os.create_user(name, *uid, *gid, &groups.value()).await?;
            }
            Correction::SetUid { name, uid } => {
                os.set_uid(name, *uid).await?;
            }
            Correction::SetGid { name, gid } => {
                os.set_gid(name, *gid).await?;
            }
            Correction::SetGroups { name, groups } => {
                if groups.ok() {
                    os.set_groups(name, &groups.value()).await?;
                }
            }
        }
        Ok(())
    }
}

/// Apply a list of corrections in order, stopping at the first failure.
/// No rollback: partial progress is acceptable because the next check
/// observes the still-drifted subset and requests a narrower list.
pub async fn execute<O: OsAdapter>(
    corrections: &[Correction],
    os: &O,
) -> Result<(), CorrectionError> {
    for correction in corrections {
        correction.apply(os).await?;
    }
    Ok(())
}
