// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `align-daemon` library surface: the fixed resource graph construction
//! and process-flag parsing that `alignd`'s `main` wires up. Split out of
//! `main.rs` so both can be exercised by integration tests without
//! spawning the real binary.

mod config;

pub use config::Config;

use align_core::{File, Resource, User};
use align_engine::{CycleError, EngineError};
use std::sync::Arc;
use thiserror::Error;

/// Top-level failure this binary can exit with — either the resource
/// graph never even started (a cycle), or the engine ran and then
/// stopped on an unrecoverable error.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("resource graph has a cyclic dependency: {0}")]
    Cycle(#[from] CycleError),
    #[error("watcher engine stopped with an error: {0}")]
    Engine(#[from] EngineError),
}

/// The fixed resource graph this daemon converges: one user and one file
/// that depends on it. Generic over the OS adapter so tests can pass a
/// fake and assert on the shape of the graph without touching a real
/// host.
pub fn expected_resources<O>(os: O, config: &Config) -> Vec<Arc<dyn Resource>>
where
    O: align_core::OsAdapter + Clone,
{
    let user = User::new("align-testing-user", 42069, 1000, os.clone())
        .with_groups(vec!["root".to_string(), "wheel".to_string()])
        .with_poll_interval(config.user_poll_interval());

    let file = File::new("/tmp/align-testing-file", os)
        .with_mode(0o664)
        .with_owner("align-testing-user")
        .with_group("align-testing-user")
        .with_dependencies(vec!["align-testing-user".to_string()]);

    vec![Arc::new(file), Arc::new(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use align_core::test_support::FakeOs;
    use clap::Parser;

    #[test]
    fn expected_resources_has_the_file_depend_on_the_user() {
        let config = Config::parse_from(["alignd"]);
        let resources = expected_resources(FakeOs::new(), &config);

        assert_eq!(resources.len(), 2);
        let file = resources
            .iter()
            .find(|r| r.id() == "/tmp/align-testing-file")
            .expect("file resource present");
        assert_eq!(file.dependencies(), ["align-testing-user"]);
    }

    #[test]
    fn the_declared_graph_has_no_cycle() {
        let config = Config::parse_from(["alignd"]);
        let resources = expected_resources(FakeOs::new(), &config);

        align_engine::layer(&resources).expect("the daemon's own graph must be acyclic");
    }
}
