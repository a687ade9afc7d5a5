// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end convergence scenarios driven through the real correction
//! executor against the call-logging fake adapter, rather than through
//! `Resource::check` alone: these confirm that applying the corrections a
//! check returns actually clears the drift it reported.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use align_adapters::fake::FakeOsAdapter;
use align_core::{execute, Drift, File, Resource, User};

#[tokio::test]
async fn missing_file_is_created_with_full_metadata_then_aligns() {
    let os = FakeOsAdapter::new();
    os.seed_user("alice", 1001, 1001, vec![]);
    os.seed_group("alice", 1001);

    let file = File::new("/tmp/align-scenario-x", os.clone())
        .with_mode(0o664)
        .with_owner("alice")
        .with_group("alice");

    let drift = file.check().await.unwrap();
    let Drift::Drifted(corrections) = drift else {
        panic!("expected a missing file to drift");
    };
    assert_eq!(
        corrections.iter().map(|c| c.name()).collect::<Vec<_>>(),
        vec!["create_file", "chmod", "chown_owner", "chown_group"]
    );

    execute(&corrections, &os).await.unwrap();

    let drift = file.check().await.unwrap();
    assert_eq!(drift, Drift::Aligned);
}

#[tokio::test]
async fn wrong_mode_alone_yields_a_single_chmod_that_clears_the_drift() {
    let os = FakeOsAdapter::new();
    os.seed_file("/tmp/align-scenario-mode", 0o644, 0, 0);

    let file = File::new("/tmp/align-scenario-mode", os.clone()).with_mode(0o777);

    let drift = file.check().await.unwrap();
    let Drift::Drifted(corrections) = drift else {
        panic!("expected a mode mismatch to drift");
    };
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].name(), "chmod");

    execute(&corrections, &os).await.unwrap();

    assert_eq!(file.check().await.unwrap(), Drift::Aligned);
}

#[tokio::test]
async fn aligned_file_with_no_optionals_reports_no_drift() {
    let os = FakeOsAdapter::new();
    os.seed_file("/tmp/align-scenario-aligned", 0o644, 0, 0);

    let file = File::new("/tmp/align-scenario-aligned", os);

    assert_eq!(file.check().await.unwrap(), Drift::Aligned);
}

#[tokio::test]
async fn missing_user_gets_the_full_repair_sequence_then_aligns() {
    let os = FakeOsAdapter::new();
    os.seed_group("wheel", 10);

    let user = User::new("align-scenario-user", 4200, 1000, os.clone())
        .with_groups(vec!["wheel".to_string()]);

    let drift = user.check().await.unwrap();
    let Drift::Drifted(corrections) = drift else {
        panic!("expected a missing user to drift");
    };
    assert_eq!(
        corrections.iter().map(|c| c.name()).collect::<Vec<_>>(),
        vec!["create_user", "set_uid", "set_gid", "set_groups"]
    );

    execute(&corrections, &os).await.unwrap();

    assert_eq!(user.check().await.unwrap(), Drift::Aligned);
}

#[tokio::test]
async fn correction_list_is_self_sufficient_for_the_state_observed_at_check_time() {
    // Immediately after executing the corrections a check returned, a
    // fresh check on the same (unmutated-by-anyone-else) resource must
    // report no further drift.
    let os = FakeOsAdapter::new();
    os.seed_file("/tmp/align-scenario-completeness", 0o600, 0, 0);

    let file = File::new("/tmp/align-scenario-completeness", os.clone()).with_mode(0o640);

    let first = file.check().await.unwrap();
    execute(first.corrections(), &os).await.unwrap();

    let second = file.check().await.unwrap();
    assert_eq!(second, Drift::Aligned);
}
