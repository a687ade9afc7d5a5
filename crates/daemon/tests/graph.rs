// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end check that the daemon's own fixed resource graph actually
//! converges through the real engine, not just that it's acyclic.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use align_adapters::fake::FakeOsAdapter;
use align_core::Resource;
use align_daemon::{expected_resources, Config};
use align_engine::Engine;
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn the_fixed_graph_converges_the_missing_user_and_its_dependent_file() {
    let os = FakeOsAdapter::new();
    os.seed_group("root", 0);
    os.seed_group("wheel", 10);

    let config = Config::parse_from(["alignd"]);
    let resources = expected_resources(os.clone(), &config);

    let engine = Engine::new(resources.clone(), os.clone()).unwrap();
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(engine.run(cancel));

    // Phase A converges synchronously; cancel before Phase B blocks
    // forever watching for further drift.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel_clone.cancel();
    handle.await.unwrap().unwrap();

    for resource in &resources {
        assert_eq!(
            resource.check().await.unwrap(),
            align_core::Drift::Aligned,
            "resource {} should have converged",
            resource.id()
        );
    }
}
