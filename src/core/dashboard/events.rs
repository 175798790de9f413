//! Lifecycle events emitted by the runner.
//!
//! Events go to an optional [`EventSink`] supplied by the caller (verbose
//! mode) and are always mirrored to the `log` facade at trace level.

use parking_lot::Mutex;
use std::fmt;
use std::io::Write;

use super::model::Status;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    GenerateStarted { tile: String, command: String },
    GenerateFailed { tile: String, error: String },
    CheckStarted { tile: String, slot: String, kind: String, target: String },
    CheckError { tile: String, slot: String, error: String },
    Resolved { tile: String, slot: String, status: Status },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::GenerateStarted { tile, command } => {
                write!(f, "  [generate] {}: {}", tile, command)
            }
            RunEvent::GenerateFailed { tile, error } => {
                write!(f, "  [warn] generate for {:?} failed: {}", tile, error)
            }
            RunEvent::CheckStarted {
                tile,
                slot,
                kind,
                target,
            } => write!(f, "  [check] {}/{}: {} {}", tile, slot, kind, target),
            RunEvent::CheckError { tile, slot, error } => {
                write!(f, "  [warn] {}/{}: check error: {}", tile, slot, error)
            }
            RunEvent::Resolved { tile, slot, status } => {
                write!(f, "  [result] {}/{}: {} {}", tile, slot, status.id, status.label)
            }
        }
    }
}

/// Receiver for run lifecycle events. Called concurrently from tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Writes one line per event to any writer (stderr in the CLI).
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn emit(&self, event: &RunEvent) {
        let mut writer = self.writer.lock();
        // Diagnostics only; a broken stderr must not affect the run.
        let _ = writeln!(writer, "{}", event);
    }
}

/// Forward `event` to the log facade and, if present, to `sink`.
pub(crate) fn emit(sink: Option<&dyn EventSink>, event: RunEvent) {
    log::trace!("{}", event.to_string().trim_start());
    if let Some(sink) = sink {
        sink.emit(&event);
    }
}
