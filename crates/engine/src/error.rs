// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::sort::CycleError;
use thiserror::Error;

/// Why the engine stopped running. Cancellation is not an error — `run`
/// returns `Ok(())` on it, treating it as graceful termination.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error(transparent)]
    Watch(#[from] align_core::WatchError),
}
