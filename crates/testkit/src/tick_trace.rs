//! Tick-stepped trace harness.
//!
//! A trace steps a small piece of state a fixed number of times and records a
//! snapshot before the first step and after each one. The resulting report is
//! compared against a golden JSON file (see [`crate::assert_json_snapshot`]).

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use restock_core::SimTick;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a tick trace.
#[derive(Debug, Clone)]
pub struct TickTraceConfig {
    /// Name written into the report.
    pub name: String,
    /// Number of steps (the report holds `steps + 1` frames).
    pub steps: u64,
    /// Host ticks between steps (e.g. one scheduler sweep period).
    pub ticks_per_step: u64,
    /// Path to the golden JSON file.
    pub snapshot_path: PathBuf,
}

/// Snapshot captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct TraceFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Full trace report.
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport<S> {
    /// Trace name.
    pub name: String,
    /// Frames in tick order.
    pub frames: Vec<TraceFrame<S>>,
}

/// Step `state` and collect frames without asserting anything.
pub fn record_tick_trace<State, Snapshot, StepFn, SnapFn>(
    config: &TickTraceConfig,
    state: &mut State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> TraceReport<Snapshot>
where
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(config.steps as usize + 1);
    let mut tick = SimTick::ZERO;
    frames.push(TraceFrame {
        tick: tick.0,
        snapshot: snapshot(tick, state),
    });

    for _ in 0..config.steps {
        step(tick, state);
        tick = tick.advance(config.ticks_per_step);
        frames.push(TraceFrame {
            tick: tick.0,
            snapshot: snapshot(tick, state),
        });
    }

    TraceReport {
        name: config.name.clone(),
        frames,
    }
}

/// Record a trace and assert (or update) its golden at `config.snapshot_path`.
pub fn run_tick_trace<State, Snapshot, StepFn, SnapFn>(
    config: TickTraceConfig,
    mut state: State,
    step: StepFn,
    snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let report = record_tick_trace(&config, &mut state, step, snapshot);
    assert_json_snapshot(&config.snapshot_path, &report)
}
