// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded async queue sink: a single background thread formats and
//! emits records pulled off a bounded channel. Producers block when the
//! queue is full — no dropping — so a stalled consumer applies
//! backpressure rather than silently losing log records.

use align_core::{Level, Sink};
use parking_lot::Mutex;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

/// The consumer thread could not be spawned (OS resource exhaustion).
#[derive(Debug, Error)]
#[error("failed to spawn the logging consumer thread: {0}")]
pub struct SinkError(#[from] std::io::Error);

struct Record {
    level: Level,
    msg: String,
    fields: Vec<(String, String)>,
}

enum Envelope {
    Record(Record),
    Close,
}

/// A `Sink` backed by a bounded channel and one consumer thread. Clones
/// share the same queue and the same consumer.
#[derive(Clone)]
pub struct AsyncSink {
    tx: SyncSender<Envelope>,
    consumer: Arc<Mutex<Option<JoinHandle<()>>>>,
    min_level: Level,
}

impl AsyncSink {
    /// Spawn the consumer thread and return a handle. `capacity` bounds
    /// the queue; callers beyond that block until the consumer catches up.
    /// Records below `min_level` are dropped before they ever reach the
    /// channel, so a filtered-out level costs nothing against `capacity`.
    pub fn spawn(capacity: usize, min_level: Level) -> Result<Self, SinkError> {
        let (tx, rx) = sync_channel(capacity);

        let consumer = std::thread::Builder::new()
            .name("align-logging".into())
            .spawn(move || {
                while let Ok(envelope) = rx.recv() {
                    match envelope {
                        Envelope::Record(record) => emit(&record),
                        Envelope::Close => break,
                    }
                }
            })?;

        Ok(Self {
            tx,
            consumer: Arc::new(Mutex::new(Some(consumer))),
            min_level,
        })
    }

    fn enqueue(&self, level: Level, msg: &str, fields: &[(&str, String)]) {
        if level < self.min_level {
            return;
        }
        let record = Record {
            level,
            msg: msg.to_string(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        };
        // A closed receiver only happens after `close()`; there is nothing
        // useful to do with a post-shutdown record, so drop it silently.
        let _ = self.tx.send(Envelope::Record(record));
    }
}

fn emit(record: &Record) {
    let rendered = record
        .fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    match record.level {
        Level::Debug => tracing::debug!(fields = %rendered, "{}", record.msg),
        Level::Info => tracing::info!(fields = %rendered, "{}", record.msg),
        Level::Warn => tracing::warn!(fields = %rendered, "{}", record.msg),
        Level::Error => tracing::error!(fields = %rendered, "{}", record.msg),
    }
}

impl Sink for AsyncSink {
    fn debug(&self, msg: &str, fields: &[(&str, String)]) {
        self.enqueue(Level::Debug, msg, fields);
    }
    fn info(&self, msg: &str, fields: &[(&str, String)]) {
        self.enqueue(Level::Info, msg, fields);
    }
    fn warn(&self, msg: &str, fields: &[(&str, String)]) {
        self.enqueue(Level::Warn, msg, fields);
    }
    fn error(&self, msg: &str, fields: &[(&str, String)]) {
        self.enqueue(Level::Error, msg, fields);
    }

    /// Close the queue and wait for the consumer thread to drain it.
    /// A no-op on every clone after the first — only one of them still
    /// holds the `JoinHandle`.
    fn close(&self) {
        let _ = self.tx.send(Envelope::Close);
        if let Some(handle) = self.consumer.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_drains_queued_records() {
        let sink = AsyncSink::spawn(8, Level::Debug).unwrap();
        for i in 0..4 {
            sink.info(&format!("message {i}"), &[("seq", i.to_string())]);
        }
        sink.close();
    }

    #[test]
    fn full_queue_blocks_instead_of_dropping() {
        let sink = AsyncSink::spawn(1, Level::Debug).unwrap();
        let producer = sink.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..20 {
                producer.info(&format!("message {i}"), &[]);
            }
        });
        // The producer thread must be able to make progress even though
        // the queue is tiny, because the consumer keeps draining it.
        handle.join().unwrap();
        sink.close();
    }

    #[test]
    fn records_below_min_level_never_reach_the_channel() {
        // Capacity 1 with three debug records below an Info threshold:
        // if gating happened after the channel instead of before, the
        // second debug call would block forever on a consumer-less queue.
        let sink = AsyncSink::spawn(1, Level::Info).unwrap();
        sink.debug("dropped one", &[]);
        sink.debug("dropped two", &[]);
        sink.debug("dropped three", &[]);
        sink.close();
    }
}
