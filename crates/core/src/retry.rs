// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An ad-hoc retry helper. Nothing in `align-engine` calls this; it
//! exists for callers of this crate that want at-least-once semantics
//! around a single fallible operation outside the watcher loop.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry `op` on `interval` until it succeeds, until `cancel` fires, or
/// until it returns an error `ignore` accepts (treated as success).
pub async fn retry<F, Fut, E>(
    cancel: &CancellationToken,
    interval: Duration,
    mut op: F,
    ignore: impl Fn(&E) -> bool,
) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), E>>,
{
    let mut ticker = tokio::time::interval(interval);
    let mut last_err = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return match last_err {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
            }
            _ = ticker.tick() => {
                match op().await {
                    Ok(()) => return Ok(()),
                    Err(e) if ignore(&e) => return Ok(()),
                    Err(e) => last_err = Some(e),
                }
            }
        }
    }
}
