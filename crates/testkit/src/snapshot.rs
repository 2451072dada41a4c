//! Golden-file JSON snapshots.
//!
//! Values are rendered as pretty JSON with object keys sorted and a trailing
//! newline, so goldens diff cleanly. Tests compare against the file on disk;
//! setting `RESTOCK_UPDATE_SNAPSHOTS=1` rewrites the golden instead.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "RESTOCK_UPDATE_SNAPSHOTS";

/// Whether a snapshot assertion compares or rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Fail on mismatch.
    Compare,
    /// Overwrite the golden with the current value.
    Update,
}

impl SnapshotMode {
    /// Mode selected by [`UPDATE_SNAPSHOTS_ENV`].
    pub fn from_env() -> Self {
        match std::env::var(UPDATE_SNAPSHOTS_ENV) {
            Ok(value) if matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes") => {
                SnapshotMode::Update
            }
            _ => SnapshotMode::Compare,
        }
    }
}

/// Assert that `value` matches the JSON snapshot stored at `path`.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    assert_json_snapshot_with_mode(path, value, SnapshotMode::from_env())
}

/// [`assert_json_snapshot`] with an explicit mode.
pub fn assert_json_snapshot_with_mode<P: AsRef<Path>, T: Serialize>(
    path: P,
    value: &T,
    mode: SnapshotMode,
) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    if mode == SnapshotMode::Update {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create snapshot directory {}", parent.display())
            })?;
        }
        return fs::write(path, &actual)
            .with_context(|| format!("Failed to write snapshot {}", path.display()));
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "Snapshot missing at {} (run with {}=1 to create it)",
            path.display(),
            UPDATE_SNAPSHOTS_ENV
        )
    })?;

    // Goldens checked out on Windows may carry CRLF endings.
    if expected.replace("\r\n", "\n") != actual {
        anyhow::bail!(
            "Snapshot mismatch at {} (run with {}=1 to update)\n--- actual ---\n{}",
            path.display(),
            UPDATE_SNAPSHOTS_ENV,
            actual
        );
    }
    Ok(())
}

/// Pretty JSON with sorted object keys and a trailing newline.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut s = serde_json::to_string_pretty(&sort_keys(value))
        .context("Failed to format snapshot JSON")?;
    s.push('\n');
    Ok(s)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
