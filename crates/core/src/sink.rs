// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The logging sink seam. The core depends only on these four leveled
//! methods plus `close`; the asynchronous bounded-queue implementation is
//! an external collaborator provided by `align-logging`.

/// Severity gating applied at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// An unrecognized level name was given to [`Level::from_str`](std::str::FromStr::from_str).
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized log level {0:?}; expected one of debug, info, warn, error")]
pub struct LevelParseError(pub String);

impl std::str::FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            _ => Err(LevelParseError(s.to_string())),
        }
    }
}

/// A structured logging sink. Implementations must be cheap to clone
/// (resources hold one each) and safe to call from any task.
pub trait Sink: Send + Sync {
    fn debug(&self, msg: &str, fields: &[(&str, String)]);
    fn info(&self, msg: &str, fields: &[(&str, String)]);
    fn warn(&self, msg: &str, fields: &[(&str, String)]);
    fn error(&self, msg: &str, fields: &[(&str, String)]);
    /// Drain and stop accepting further records.
    fn close(&self);
}

/// A sink that discards everything. Used by tests and anywhere a `Sink`
/// is required but observability is not under test.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn debug(&self, _msg: &str, _fields: &[(&str, String)]) {}
    fn info(&self, _msg: &str, _fields: &[(&str, String)]) {}
    fn warn(&self, _msg: &str, _fields: &[(&str, String)]) {}
    fn error(&self, _msg: &str, _fields: &[(&str, String)]) {}
    fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn every_canonical_name_parses() {
        assert_eq!(Level::from_str("debug").unwrap(), Level::Debug);
        assert_eq!(Level::from_str("info").unwrap(), Level::Info);
        assert_eq!(Level::from_str("warn").unwrap(), Level::Warn);
        assert_eq!(Level::from_str("error").unwrap(), Level::Error);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(Level::from_str("DEBUG").unwrap(), Level::Debug);
        assert_eq!(Level::from_str("Warn").unwrap(), Level::Warn);
    }

    #[test]
    fn warning_is_accepted_as_an_alias_for_warn() {
        assert_eq!(Level::from_str("warning").unwrap(), Level::Warn);
    }

    #[test]
    fn an_unrecognized_name_is_rejected() {
        let err = Level::from_str("trace").unwrap_err();
        assert_eq!(err.0, "trace");
    }

    #[test]
    fn ordering_places_debug_below_error() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }
}
