// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `alignd`: the desired-state convergence agent.
//!
//! Wires `align-core`'s resource model, `align-adapters`' real OS
//! adapter, `align-logging`'s async sink, and `align-engine`'s
//! two-phase watcher engine together. The resource graph is built in
//! code; there is no declarative loader or subcommand surface here.
//! Everything testable lives in `lib.rs` — this is deliberately thin.

use align_adapters::RealOs;
use align_core::Sink;
use align_daemon::{expected_resources, Config, DaemonError};
use align_engine::Engine;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    // Held for the process lifetime: dropping it would stop the
    // non-blocking file writer from flushing.
    let _log_guard = setup_tracing(&config.log_level, config.log_file.as_deref());
    tracing::info!(log_level = %config.log_level, "alignd starting");

    let sink = align_logging::setup(config.log_queue_capacity, config.sink_level())?;
    let sink: Arc<dyn Sink> = Arc::new(sink.clone());

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.cancel();
    });

    let os = RealOs::new();
    let resources = expected_resources(os.clone(), &config);

    let result: Result<(), DaemonError> = match Engine::with_sink(resources, os, sink.clone()) {
        Ok(engine) => engine.run(cancel).await.map_err(DaemonError::from),
        Err(cycle) => Err(DaemonError::from(cycle)),
    };

    if let Err(ref err) = result {
        sink.error("daemon stopped with an error", &[("error", err.to_string())]);
    }
    align_logging::close();

    result?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn make_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the tracing subscriber. Stdout always gets a formatted layer;
/// when `log_file` is set, a second layer writes the same records through
/// a `tracing-appender` non-blocking file writer. Returns the writer's
/// guard when one was installed — the caller must keep it alive for as
/// long as logging is expected to reach the file.
fn setup_tracing(
    log_level: &str,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("alignd.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(make_filter(log_level))
                .with(fmt::layer())
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(make_filter(log_level))
                .with(fmt::layer())
                .init();
            None
        }
    }
}
