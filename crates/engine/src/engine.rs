// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two-phase watcher engine: layered synchronous initial convergence,
//! then concurrent per-resource watch loops funneling corrections through
//! a single serial dispatcher.

use crate::error::EngineError;
use crate::sort::{layer, CycleError};
use align_core::{NoopSink, OsAdapter, Resource, Sink};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Orchestrates a fixed set of resources against a shared OS adapter.
/// Resources are constructed once by the caller and never added to or
/// removed from after `Engine::new`. The engine logs through an injected
/// `Sink` rather than a global facade — `align-daemon` wires the real one
/// in; tests can pass `NoopSink`.
pub struct Engine<O> {
    resources: Vec<Arc<dyn Resource>>,
    os: O,
    sink: Arc<dyn Sink>,
}

impl<O: OsAdapter + Clone> Engine<O> {
    /// Validates the dependency graph eagerly so a cycle is reported
    /// before any watch ever starts.
    pub fn new(resources: Vec<Arc<dyn Resource>>, os: O) -> Result<Self, CycleError> {
        Self::with_sink(resources, os, Arc::new(NoopSink))
    }

    pub fn with_sink(
        resources: Vec<Arc<dyn Resource>>,
        os: O,
        sink: Arc<dyn Sink>,
    ) -> Result<Self, CycleError> {
        layer(&resources)?;
        Ok(Self { resources, os, sink })
    }

    /// Run Phase A then Phase B until `cancel` fires or an unrecoverable
    /// error occurs. Returns `Ok(())` on graceful cancellation.
    #[tracing::instrument(skip_all, fields(resources = self.resources.len()))]
    pub async fn run(self, cancel: CancellationToken) -> Result<(), EngineError> {
        let layers = layer(&self.resources)?;
        self.sink.info(
            "resources layered for initial convergence",
            &[("layers", layers.len().to_string())],
        );

        for (depth, indices) in layers.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(());
            }
            if let Some(err) = self.converge_layer(indices, &cancel).await? {
                self.sink.error(
                    "layer convergence failed",
                    &[("depth", depth.to_string()), ("error", err.to_string())],
                );
                return Err(err);
            }
        }

        self.watch_all(cancel).await
    }

    /// Phase A for a single layer: every resource in it converges
    /// concurrently; the layer barrier is this function returning.
    #[tracing::instrument(skip_all, fields(layer_size = indices.len()))]
    async fn converge_layer(
        &self,
        indices: &[usize],
        cancel: &CancellationToken,
    ) -> Result<Option<EngineError>, EngineError> {
        tracing::debug!("converging layer");
        let mut set = JoinSet::new();
        for &idx in indices {
            let resource = self.resources[idx].clone();
            set.spawn(async move { resource.converge().await });
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    set.abort_all();
                    return Ok(None);
                }
                joined = set.join_next() => {
                    match joined {
                        None => return Ok(None),
                        Some(Ok(Ok(_drift))) => {}
                        Some(Ok(Err(watch_err))) => {
                            set.abort_all();
                            return Ok(Some(EngineError::Watch(watch_err)));
                        }
                        Some(Err(join_err)) => {
                            set.abort_all();
                            return Err(panic_as_engine_error(join_err));
                        }
                    }
                }
            }
        }
    }

    /// Phase B: every resource's `watch` runs concurrently, sharing one
    /// corrections channel; the dispatcher applies batches serially, so
    /// at most one correction executes at any instant across the engine.
    async fn watch_all(self, cancel: CancellationToken) -> Result<(), EngineError> {
        let (tx, mut rx) = tokio::sync::mpsc::channel(64);
        let mut watchers = JoinSet::new();

        for resource in &self.resources {
            let resource = resource.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            watchers.spawn(async move { resource.watch(tx, cancel).await });
        }
        drop(tx);
        self.sink.info("watching resources", &[("count", self.resources.len().to_string())]);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    watchers.abort_all();
                    return Ok(());
                }
                batch = rx.recv() => {
                    let Some(batch) = batch else {
                        // All watchers dropped their sender — every watch
                        // loop exited on its own, nothing left to dispatch.
                        return Ok(());
                    };
                    for correction in &batch.corrections {
                        self.sink.info(correction.name(), &correction.fields());
                    }
                    if let Err(e) = align_core::execute(&batch.corrections, &self.os).await {
                        self.sink.error(
                            "correction failed",
                            &[("resource", batch.resource_id.clone()), ("error", e.to_string())],
                        );
                        return Err(EngineError::Watch(align_core::WatchError::Correction(e)));
                    }
                }
                joined = watchers.join_next() => {
                    match joined {
                        None => return Ok(()),
                        Some(Ok(Ok(()))) => {}
                        Some(Ok(Err(watch_err))) => {
                            watchers.abort_all();
                            self.sink.error("watcher failed", &[("error", watch_err.to_string())]);
                            return Err(EngineError::Watch(watch_err));
                        }
                        Some(Err(join_err)) => {
                            watchers.abort_all();
                            return Err(panic_as_engine_error(join_err));
                        }
                    }
                }
            }
        }
    }
}

fn panic_as_engine_error(join_err: tokio::task::JoinError) -> EngineError {
    EngineError::Watch(align_core::WatchError::Watch(align_core::OsError::Watch {
        path: String::new(),
        source: align_core::notify_error::NotifyError(format!(
            "resource task panicked: {join_err}"
        )),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use align_core::test_support::FakeOs;
    use align_core::{File, FsMutator, FsWatchAdapter, StatAdapter, UserDirectory, UserMutator};

    #[tokio::test]
    async fn converges_a_missing_file_before_returning() {
        let os = FakeOs::new();
        let resources: Vec<Arc<dyn Resource>> =
            vec![Arc::new(File::new("/tmp/align-engine-test", os.clone()).with_mode(0o640))];

        let engine = Engine::new(resources, os.clone()).unwrap();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(engine.run(cancel));

        // Let Phase A converge, then cancel before Phase B blocks forever.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cancel_clone.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cyclic_resources_are_rejected_before_any_watch_starts() {
        let os = FakeOs::new();
        let resources: Vec<Arc<dyn Resource>> = vec![
            Arc::new(
                File::new("/f1", os.clone()).with_dependencies(vec!["/f2".to_string()]),
            ),
            Arc::new(
                File::new("/f2", os.clone()).with_dependencies(vec!["/f1".to_string()]),
            ),
        ];

        assert!(Engine::new(resources, os).is_err());
    }

    /// A resource with no real check/watch behavior: `converge` records its
    /// id in a shared log after an artificial delay, and `watch` just waits
    /// for cancellation. Used to observe *when* a resource's convergence
    /// ran relative to others, not what it did to the host.
    struct DelayedResource {
        id: String,
        dependencies: Vec<String>,
        delay: std::time::Duration,
        log: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Resource for DelayedResource {
        fn id(&self) -> &str {
            &self.id
        }

        fn dependencies(&self) -> &[String] {
            &self.dependencies
        }

        async fn check(&self) -> Result<align_core::Drift, align_core::CheckError> {
            Ok(align_core::Drift::Aligned)
        }

        async fn converge(&self) -> Result<align_core::Drift, align_core::WatchError> {
            tokio::time::sleep(self.delay).await;
            self.log.lock().unwrap().push(self.id.clone());
            Ok(align_core::Drift::Aligned)
        }

        async fn watch(
            &self,
            _corrections: tokio::sync::mpsc::Sender<align_core::CorrectionBatch>,
            cancel: CancellationToken,
        ) -> Result<(), align_core::WatchError> {
            cancel.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn layer_barrier_holds_child_back_until_parent_layer_drains() {
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let os = FakeOs::new();

        let parent = std::sync::Arc::new(DelayedResource {
            id: "parent".to_string(),
            dependencies: vec![],
            delay: std::time::Duration::from_millis(50),
            log: log.clone(),
        });
        let child = std::sync::Arc::new(DelayedResource {
            id: "child".to_string(),
            dependencies: vec!["parent".to_string()],
            delay: std::time::Duration::from_millis(0),
            log: log.clone(),
        });
        let resources: Vec<Arc<dyn Resource>> = vec![parent, child];

        let engine = Engine::new(resources, os).unwrap();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(engine.run(cancel));

        tokio::time::sleep(std::time::Duration::from_millis(90)).await;
        cancel_clone.cancel();
        handle.await.unwrap().unwrap();

        // If the child's layer had started before the parent layer's
        // `JoinSet` drained, the zero-delay child would have recorded
        // itself before the 50ms parent did.
        assert_eq!(*log.lock().unwrap(), vec!["parent".to_string(), "child".to_string()]);
    }

    /// A resource that sends a single `Chmod` correction on a unique path
    /// as soon as Phase B starts watching it, then waits for cancellation.
    /// Used to make two corrections arrive at the dispatcher at roughly
    /// the same time.
    struct BurstResource {
        id: String,
        path: std::path::PathBuf,
    }

    #[async_trait::async_trait]
    impl Resource for BurstResource {
        fn id(&self) -> &str {
            &self.id
        }

        fn dependencies(&self) -> &[String] {
            &[]
        }

        async fn check(&self) -> Result<align_core::Drift, align_core::CheckError> {
            Ok(align_core::Drift::Aligned)
        }

        async fn converge(&self) -> Result<align_core::Drift, align_core::WatchError> {
            Ok(align_core::Drift::Aligned)
        }

        async fn watch(
            &self,
            corrections: tokio::sync::mpsc::Sender<align_core::CorrectionBatch>,
            cancel: CancellationToken,
        ) -> Result<(), align_core::WatchError> {
            let _ = corrections
                .send(align_core::CorrectionBatch {
                    resource_id: self.id.clone(),
                    corrections: vec![align_core::Correction::Chmod {
                        path: self.path.clone(),
                        mode: align_core::Optional::some(0o600),
                    }],
                })
                .await;
            cancel.cancelled().await;
            Ok(())
        }
    }

    /// An `OsAdapter` that delegates everything to a `FakeOs`, except
    /// `chmod`, which tracks how many calls are in flight at once (with an
    /// artificial delay long enough for a second, concurrently-arriving
    /// call to overlap it if the dispatcher were not serial).
    #[derive(Clone)]
    struct TrackingOs {
        inner: FakeOs,
        in_flight: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        max_in_flight: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl align_core::StatAdapter for TrackingOs {
        async fn stat(
            &self,
            path: &std::path::Path,
        ) -> Result<Option<align_core::FileStat>, align_core::OsError> {
            self.inner.stat(path).await
        }
    }

    #[async_trait::async_trait]
    impl align_core::FsMutator for TrackingOs {
        async fn create_empty(&self, path: &std::path::Path) -> Result<(), align_core::OsError> {
            self.inner.create_empty(path).await
        }

        async fn chmod(&self, path: &std::path::Path, mode: u32) -> Result<(), align_core::OsError> {
            use std::sync::atomic::Ordering;
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.chmod(path, mode).await
        }

        async fn chown(
            &self,
            path: &std::path::Path,
            uid: Option<u32>,
            gid: Option<u32>,
        ) -> Result<(), align_core::OsError> {
            self.inner.chown(path, uid, gid).await
        }
    }

    #[async_trait::async_trait]
    impl align_core::UserDirectory for TrackingOs {
        async fn lookup_user(
            &self,
            name: &str,
        ) -> Result<Option<align_core::UserDetails>, align_core::OsError> {
            self.inner.lookup_user(name).await
        }
        async fn lookup_group(&self, name: &str) -> Result<Option<u32>, align_core::OsError> {
            self.inner.lookup_group(name).await
        }
        async fn lookup_uid(&self, uid: u32) -> Result<Option<String>, align_core::OsError> {
            self.inner.lookup_uid(uid).await
        }
        async fn lookup_gid(&self, gid: u32) -> Result<Option<String>, align_core::OsError> {
            self.inner.lookup_gid(gid).await
        }
    }

    #[async_trait::async_trait]
    impl align_core::UserMutator for TrackingOs {
        async fn create_user(
            &self,
            name: &str,
            uid: u32,
            gid: u32,
            groups: &[String],
        ) -> Result<(), align_core::OsError> {
            self.inner.create_user(name, uid, gid, groups).await
        }
        async fn set_uid(&self, name: &str, uid: u32) -> Result<(), align_core::OsError> {
            self.inner.set_uid(name, uid).await
        }
        async fn set_gid(&self, name: &str, gid: u32) -> Result<(), align_core::OsError> {
            self.inner.set_gid(name, gid).await
        }
        async fn set_groups(&self, name: &str, groups: &[String]) -> Result<(), align_core::OsError> {
            self.inner.set_groups(name, groups).await
        }
    }

    impl align_core::FsWatchAdapter for TrackingOs {
        fn watch(&self, path: &std::path::Path) -> Result<align_core::FsWatch, align_core::OsError> {
            self.inner.watch(path)
        }
    }

    #[tokio::test]
    async fn serial_dispatch_never_overlaps_two_concurrently_arriving_corrections() {
        let os = TrackingOs {
            inner: FakeOs::new(),
            in_flight: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            max_in_flight: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        };

        let resources: Vec<Arc<dyn Resource>> = vec![
            Arc::new(BurstResource {
                id: "burst-a".to_string(),
                path: std::path::PathBuf::from("/tmp/align-burst-a"),
            }),
            Arc::new(BurstResource {
                id: "burst-b".to_string(),
                path: std::path::PathBuf::from("/tmp/align-burst-b"),
            }),
        ];

        let max_in_flight = os.max_in_flight.clone();
        let engine = Engine::new(resources, os).unwrap();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(engine.run(cancel));

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        cancel_clone.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
