// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! The global logging facade: a single bounded-queue async sink installed
//! once per process, the same `Setup`/`Global` shape as a `sync.Once`-guarded
//! pair in other languages — here built on `std::sync::OnceLock` since Rust
//! needs no runtime-provided once-cell primitive.

mod sink;

pub use sink::{AsyncSink, SinkError};

use align_core::{Level, NoopSink, Sink};
use std::sync::OnceLock;

static SINK: OnceLock<AsyncSink> = OnceLock::new();
static FALLBACK: NoopSink = NoopSink;

/// Install the global sink with the given bounded queue capacity and
/// minimum level. A second call is a no-op — the first caller wins,
/// matching `sync.Once` semantics. Only the first call's `capacity` and
/// `min_level` take effect; later calls return the already-installed sink
/// regardless of the arguments they pass.
pub fn setup(capacity: usize, min_level: Level) -> Result<&'static AsyncSink, SinkError> {
    if let Some(sink) = SINK.get() {
        return Ok(sink);
    }
    let sink = AsyncSink::spawn(capacity, min_level)?;
    Ok(SINK.get_or_init(|| sink))
}

/// The process-wide sink, or a no-op sink if `setup` has not run yet.
pub fn global() -> &'static dyn Sink {
    match SINK.get() {
        Some(sink) => sink,
        None => &FALLBACK,
    }
}

/// Drain and stop the global sink, if one was ever installed.
pub fn close() {
    if let Some(sink) = SINK.get() {
        sink.close();
    }
}
