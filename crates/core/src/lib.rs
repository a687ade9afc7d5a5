// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! align-core: the resource abstraction and correction protocol for the
//! desired-state convergence agent.

mod adapter;
mod correction;
mod file;
mod mode_fmt;
mod optional;
mod resource;
mod retry;
mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod user;

pub use adapter::{
    notify_error, FileStat, FsMutator, FsWatch, FsWatchAdapter, OsAdapter, OsError, StatAdapter,
    UserDetails, UserDirectory, UserMutator,
};
pub use correction::{execute, Correction, CorrectionError};
pub use file::File;
pub use mode_fmt::format_mode;
pub use optional::Optional;
pub use resource::{CheckError, CorrectionBatch, Drift, Resource, WatchError};
pub use retry::retry;
pub use sink::{Level, LevelParseError, NoopSink, Sink};
pub use user::{User, DEFAULT_POLL_INTERVAL};
