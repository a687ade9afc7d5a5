// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process flags. Deliberately thin: no declarative resource file and no
//! subcommand surface (both out of scope), just enough to keep the
//! logging level, the user-poll interval, the log queue capacity, and an
//! optional file-logging destination configurable without editing the
//! binary.

use align_core::DEFAULT_POLL_INTERVAL;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "alignd", about = "Desired-state convergence agent")]
pub struct Config {
    /// Minimum level emitted by the structured logging sink.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// How often the user resource polls the user database, in seconds.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub user_poll_interval_secs: u64,

    /// Capacity of the bounded logging queue.
    #[arg(long, default_value_t = 512)]
    pub log_queue_capacity: usize,

    /// Additional destination for tracing output. When unset, only
    /// stdout receives formatted log records; when set, the same records
    /// are also written through a non-blocking `tracing-appender` file
    /// writer at this path.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn user_poll_interval(&self) -> Duration {
        Duration::from_secs(self.user_poll_interval_secs)
    }

    /// The sink's enqueue-time gate. Falls back to `Info` on an
    /// unrecognized `--log-level` value rather than failing startup —
    /// `setup_tracing`'s `EnvFilter` is the surface that actually rejects
    /// a malformed filter string.
    pub fn sink_level(&self) -> align_core::Level {
        self.log_level.parse().unwrap_or(align_core::Level::Info)
    }
}
