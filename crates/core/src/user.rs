// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user resource: `{ name, uid, gid, groups? }`.
//!
//! No kernel notification exists for user-database mutations, so `watch`
//! polls on a fixed interval (5 seconds by default).

use crate::adapter::OsAdapter;
use crate::correction::{execute, Correction};
use crate::optional::Optional;
use crate::resource::{CheckError, CorrectionBatch, Drift, Resource, WatchError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// The default poll interval; override with `User::with_poll_interval`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct User<O> {
    name: String,
    uid: u32,
    gid: u32,
    groups: Optional<Vec<String>>,
    dependencies: Vec<String>,
    poll_interval: Duration,
    os: O,
}

impl<O: OsAdapter> User<O> {
    /// `uid` and `gid` are required — unlike file attributes, there is no
    /// unspecified form for them.
    pub fn new(name: impl Into<String>, uid: u32, gid: u32, os: O) -> Self {
        Self {
            name: name.into(),
            uid,
            gid,
            groups: Optional::none(),
            dependencies: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            os,
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = Optional::some(groups);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn full_repair(&self) -> Vec<Correction> {
        vec![
            Correction::CreateUser {
                name: self.name.clone(),
                uid: self.uid,
                gid: self.gid,
                groups: self.groups.clone(),
            },
            Correction::SetUid {
                name: self.name.clone(),
                uid: self.uid,
            },
            Correction::SetGid {
                name: self.name.clone(),
                gid: self.gid,
            },
            Correction::SetGroups {
                name: self.name.clone(),
                groups: self.groups.clone(),
            },
        ]
    }

    fn check_error(&self, source: crate::adapter::OsError) -> CheckError {
        CheckError {
            id: self.id().to_string(),
            source,
        }
    }
}

#[async_trait]
impl<O: OsAdapter> Resource for User<O> {
    fn id(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    async fn check(&self) -> Result<Drift, CheckError> {
        let details = self
            .os
            .lookup_user(&self.name)
            .await
            .map_err(|e| self.check_error(e))?;

        let Some(details) = details else {
            return Ok(Drift::Drifted(self.full_repair()));
        };

        let mut corrections = Vec::new();

        if details.uid != self.uid {
            corrections.push(Correction::SetUid {
                name: self.name.clone(),
                uid: self.uid,
            });
        }

        if details.gid != self.gid {
            corrections.push(Correction::SetGid {
                name: self.name.clone(),
                gid: self.gid,
            });
        }

        if self.groups.ok() {
            for group in self.groups.value() {
                let gid = self
                    .os
                    .lookup_group(&group)
                    .await
                    .map_err(|e| self.check_error(e))?
                    .ok_or_else(|| {
                        self.check_error(crate::adapter::OsError::GroupLookup(
                            group.clone(),
                            "unknown group".to_string(),
                        ))
                    })?;
                if !details.group_ids.contains(&gid) {
                    corrections.push(Correction::SetGroups {
                        name: self.name.clone(),
                        groups: self.groups.clone(),
                    });
                    break;
                }
            }
        }

        if corrections.is_empty() {
            Ok(Drift::Aligned)
        } else {
            Ok(Drift::Drifted(corrections))
        }
    }

    async fn converge(&self) -> Result<Drift, WatchError> {
        let drift = self.check().await?;
        if let Drift::Drifted(ref list) = drift {
            execute(list, &self.os).await?;
        }
        Ok(drift)
    }

    async fn watch(
        &self,
        corrections: Sender<CorrectionBatch>,
        cancel: CancellationToken,
    ) -> Result<(), WatchError> {
        // Initial synchronous check + apply, same as the file resource.
        self.converge().await?;

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Ok(());
                }
                _ = interval.tick() => {
                    let drift = self.check().await?;
                    if let Drift::Drifted(list) = drift {
                        let _ = corrections
                            .send(CorrectionBatch {
                                resource_id: self.id().to_string(),
                                corrections: list,
                            })
                            .await;
                    }
                }
            }
        }
    }
}
