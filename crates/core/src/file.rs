// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The file resource: `{ path, mode?, owner?, group? }`.

use crate::adapter::OsAdapter;
use crate::correction::{execute, Correction};
use crate::optional::Optional;
use crate::resource::{CheckError, CorrectionBatch, Drift, Resource, WatchError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Desired state for a single file. Constructed once by the caller and
/// never mutated for the lifetime of the process.
pub struct File<O> {
    path: PathBuf,
    mode: Optional<u32>,
    owner: Optional<String>,
    group: Optional<String>,
    dependencies: Vec<String>,
    os: O,
}

impl<O: OsAdapter> File<O> {
    pub fn new(path: impl Into<PathBuf>, os: O) -> Self {
        Self {
            path: path.into(),
            mode: Optional::none(),
            owner: Optional::none(),
            group: Optional::none(),
            dependencies: Vec::new(),
            os,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Optional::some(mode);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Optional::some(owner.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Optional::some(group.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    fn full_repair(&self) -> Vec<Correction> {
        vec![
            Correction::CreateFile {
                path: self.path.clone(),
            },
            Correction::Chmod {
                path: self.path.clone(),
                mode: self.mode.clone(),
            },
            Correction::ChownOwner {
                path: self.path.clone(),
                owner: self.owner.clone(),
            },
            Correction::ChownGroup {
                path: self.path.clone(),
                group: self.group.clone(),
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
impl<O: OsAdapter> Resource for File<O> {
    fn id(&self) -> &str {
        // `to_str` is infallible for the paths this agent manages; paths
        // come from the caller's own declarations, not from user input.
        self.path.to_str().unwrap_or_default()
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    async fn check(&self) -> Result<Drift, CheckError> {
        let stat = self
            .os
            .stat(&self.path)
            .await
            .map_err(|e| self.check_error(e))?;

        let Some(stat) = stat else {
            return Ok(Drift::Drifted(self.full_repair()));
        };

        let mut corrections = Vec::new();

        if self.mode.ok() && stat.mode & 0o7777 != self.mode.value() & 0o7777 {
            corrections.push(Correction::Chmod {
                path: self.path.clone(),
                mode: self.mode.clone(),
            });
        }

        if self.owner.ok() {
            let owner = self
                .os
                .lookup_uid(stat.uid)
                .await
                .map_err(|e| self.check_error(e))?;
            if owner.as_deref() != Some(self.owner.value().as_str()) {
                corrections.push(Correction::ChownOwner {
                    path: self.path.clone(),
                    owner: self.owner.clone(),
                });
            }
        }

        if self.group.ok() {
            let group = self
                .os
                .lookup_gid(stat.gid)
                .await
                .map_err(|e| self.check_error(e))?;
            if group.as_deref() != Some(self.group.value().as_str()) {
                corrections.push(Correction::ChownGroup {
                    path: self.path.clone(),
                    group: self.group.clone(),
                });
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
        // Initial synchronous check + apply, before any event is ever observed.
        let drift = self.converge().await?;

        let mut fs_watch = self.os.watch(&self.path)?;

        // Track the drift we last observed so a self-induced fsnotify event
        // (the correction we just applied firing its own watch event)
        // doesn't re-trigger another round-trip: if a subsequent check
        // reports the same alignment we just achieved, there is nothing new
        // to report. State-based suppression — no debounce timer, no
        // generation counter, just "did check actually change anything".
        let mut last_drift = drift;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Ok(());
                }
                event = fs_watch.events.recv() => {
                    if event.is_none() {
                        // Watch source closed — treat as a hard failure,
                        // there is nothing left to observe.
                        return Err(WatchError::Watch(crate::adapter::OsError::Watch {
                            path: self.path.display().to_string(),
                            source: crate::adapter::notify_error::NotifyError(
                                "event stream closed".to_string(),
                            ),
                        }));
                    }

                    let drift = self.check().await?;
                    if drift == last_drift {
                        // Same drift (or lack of it) as last time: either
                        // nothing changed, or this is the event our own
                        // correction produced and it already fixed things.
                        continue;
                    }

                    if let Drift::Drifted(ref list) = drift {
                        let _ = corrections
                            .send(CorrectionBatch {
                                resource_id: self.id().to_string(),
                                corrections: list.clone(),
                            })
                            .await;
                    }
                    last_drift = drift;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeOs;

    fn fake_with(path: &str) -> (FakeOs, File<FakeOs>) {
        let os = FakeOs::new();
        let file = File::new(path, os.clone());
        (os, file)
    }

    #[tokio::test]
    async fn missing_file_reports_full_repair_sequence() {
        let (_os, file) = fake_with("/tmp/x");
        let file = file.with_mode(0o664).with_owner("alice").with_group("alice");

        let drift = file.check().await.unwrap();
        let Drift::Drifted(corrections) = drift else {
            panic!("expected drift");
        };
        assert_eq!(
            corrections.iter().map(Correction::name).collect::<Vec<_>>(),
            vec!["create_file", "chmod", "chown_owner", "chown_group"]
        );
    }

    #[tokio::test]
    async fn aligned_file_has_no_corrections() {
        let (os, file) = fake_with("/tmp/x");
        os.seed_file("/tmp/x", 0o664, "alice", "alice");
        let file = file.with_mode(0o664).with_owner("alice").with_group("alice");

        let drift = file.check().await.unwrap();
        assert_eq!(drift, Drift::Aligned);
    }

    #[tokio::test]
    async fn wrong_mode_yields_single_chmod_correction() {
        let (os, file) = fake_with("/tmp/x");
        os.seed_file("/tmp/x", 0o644, "root", "root");
        let file = file.with_mode(0o777);

        let drift = file.check().await.unwrap();
        let Drift::Drifted(corrections) = drift else {
            panic!("expected drift");
        };
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].name(), "chmod");
    }

    #[tokio::test]
    async fn unspecified_attributes_never_drift() {
        let (os, file) = fake_with("/tmp/x");
        os.seed_file("/tmp/x", 0o600, "anyone", "anygroup");
        // No with_mode/with_owner/with_group calls at all.

        let drift = file.check().await.unwrap();
        assert_eq!(drift, Drift::Aligned);
    }
}
