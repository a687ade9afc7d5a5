// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real filesystem watch, bridging `notify`'s callback-style watcher into
//! the `mpsc::Receiver<()>` shape `align-core` expects.

use align_core::{notify_error::NotifyError, FsWatch, OsError};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Default)]
pub struct RealWatch;

impl RealWatch {
    pub fn new() -> Self {
        Self
    }
}

/// The event kinds that matter to a resource watching a path: create,
/// write, remove, rename, chmod. Anything else — in particular `Access`,
/// which some backends report on a plain read — must not re-trigger a
/// check.
fn is_target_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Metadata(_))
    )
}

impl align_core::FsWatchAdapter for RealWatch {
    fn watch(&self, path: &Path) -> Result<FsWatch, OsError> {
        tracing::debug!(path = %path.display(), "installing filesystem watch");
        let (tx, rx) = mpsc::channel(32);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                if is_target_event(&event.kind) {
                    let _ = tx.blocking_send(());
                }
            }
        })
        .map_err(|e| OsError::Watch {
            path: path.display().to_string(),
            source: NotifyError(e.to_string()),
        })?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| OsError::Watch {
                path: path.display().to_string(),
                source: NotifyError(e.to_string()),
            })?;

        Ok(FsWatch::new(rx, Box::new(watcher) as Box<dyn std::any::Any + Send>))
    }
}
