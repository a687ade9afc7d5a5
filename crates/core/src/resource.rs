// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The common resource contract: `id`, `check`, `watch`, `dependencies`.

use crate::correction::{Correction, CorrectionError};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Outcome of comparing desired to observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// Every specified attribute matches; nothing to do.
    Aligned,
    /// At least one specified attribute is misaligned. The list is
    /// self-sufficient to restore alignment from the state observed at the
    /// call — it is not guaranteed idempotent across interleaved external
    /// mutations.
    Drifted(Vec<Correction>),
}

impl Drift {
    pub fn is_aligned(&self) -> bool {
        matches!(self, Drift::Aligned)
    }

    pub fn corrections(&self) -> &[Correction] {
        match self {
            Drift::Aligned => &[],
            Drift::Drifted(corrections) => corrections,
        }
    }
}

/// `check` could not complete — distinct from drift, which `check`
/// reports as data, not as an error.
#[derive(Debug, Error)]
#[error("check failed for resource {id}: {source}")]
pub struct CheckError {
    pub id: String,
    #[source]
    pub source: crate::adapter::OsError,
}

/// A correction list, paired with the resource that produced it, flowing
/// from a watch loop into the shared dispatcher.
#[derive(Debug, Clone)]
pub struct CorrectionBatch {
    pub resource_id: String,
    pub corrections: Vec<Correction>,
}

/// Why a watch loop stopped running.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error(transparent)]
    Correction(#[from] CorrectionError),
    #[error("failed to install filesystem watch: {0}")]
    Watch(#[from] crate::adapter::OsError),
}

/// An observable host entity identified by a stable string id.
///
/// Ids are unique within a run; the dependency graph over `dependencies()`
/// is acyclic (enforced by the topological sorter, not by this trait).
#[async_trait]
pub trait Resource: Send + Sync {
    /// Stable identifier: an absolute path for files, a username for users.
    fn id(&self) -> &str;

    /// Ids of resources that must be converged before this one.
    fn dependencies(&self) -> &[String];

    /// Compare desired to observed state.
    async fn check(&self) -> Result<Drift, CheckError>;

    /// Check once and, if drifted, apply the resulting corrections.
    /// Returns the drift that was observed (and, if any, corrected) so
    /// callers like `watch`'s first tick can seed their own state without
    /// checking a second time. Shared by Phase A's layered initial
    /// convergence.
    async fn converge(&self) -> Result<Drift, WatchError>;

    /// Run until `cancel` fires, sending a batch on `corrections` whenever
    /// drift is observed. Returns on cancellation or on an unrecoverable
    /// error; an unrecoverable error from any resource halts the whole
    /// engine, by design — there is no per-resource isolation or retry.
    async fn watch(
        &self,
        corrections: tokio::sync::mpsc::Sender<CorrectionBatch>,
        cancel: CancellationToken,
    ) -> Result<(), WatchError>;
}
