#![warn(missing_docs)]
//! Testing and replay surfaces: golden JSON snapshots, tick-stepped traces
//! and a newline-delimited restock event log.

mod snapshot;
mod tick_trace;

use anyhow::{Context, Result};
use restock_core::SimTick;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use snapshot::*;
pub use tick_trace::*;

/// Kind of restock event recorded by the headless driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestockEventKind {
    /// A container was registered.
    Registered,
    /// The scheduler restocked a container.
    AutoRestocked,
    /// An actor restocked a container by hand.
    ManualRestocked,
    /// A record was dropped because its block no longer qualifies.
    Removed,
}

/// One line of the event log.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Host tick when the event occurred.
    pub tick: SimTick,
    /// What happened.
    pub kind: RestockEventKind,
    /// Canonical location key.
    pub location: &'a str,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
