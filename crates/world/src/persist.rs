//! Restock state document.
//!
//! The document is a JSON object keyed by canonical location key:
//!
//! ```json
//! {
//!   "world:10:64:-3": {
//!     "items": [{"type": "bread", "amount": 3, "variant": 0}, null],
//!     "timer": 120,
//!     "restock_time": 300
//!   }
//! }
//! ```
//!
//! Loading decodes each entry on its own so one corrupt record only drops
//! that record.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use restock_core::{ItemSlot, LocationKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ContainerRecord, MalformedRecord, StoreError};

/// File name of the state document inside a data directory.
pub const STATE_FILE_NAME: &str = "restock.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    items: Vec<Option<ItemSlot>>,
    timer: u32,
    #[serde(default)]
    restock_time: Option<u32>,
}

/// Outcome of loading the state document.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Records that decoded cleanly.
    pub records: BTreeMap<LocationKey, ContainerRecord>,
    /// Entries that were skipped.
    pub skipped: Vec<MalformedRecord>,
}

/// JSON file holding every registered container.
#[derive(Debug, Clone)]
pub struct RestockStore {
    path: PathBuf,
}

impl RestockStore {
    /// Store backed by the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store backed by [`STATE_FILE_NAME`] inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(STATE_FILE_NAME))
    }

    /// Path of the state document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every record.
    pub fn save(&self, records: &BTreeMap<LocationKey, ContainerRecord>) -> Result<(), StoreError> {
        let document: BTreeMap<String, StoredRecord> = records
            .iter()
            .map(|(key, record)| {
                (
                    key.to_string(),
                    StoredRecord {
                        items: record.template.clone(),
                        timer: record.timer,
                        restock_time: Some(record.restock_interval),
                    },
                )
            })
            .collect();

        let json = serde_json::to_string_pretty(&document)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Read every record.
    ///
    /// A missing file is an empty report. A document that is not a JSON object
    /// is an error. Entries missing `restock_time` take `default_interval`.
    pub fn load(&self, default_interval: u32) -> Result<LoadReport, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(err) => return Err(err.into()),
        };
        decode_document(&contents, default_interval)
    }
}

fn decode_document(contents: &str, default_interval: u32) -> Result<LoadReport, StoreError> {
    if contents.trim().is_empty() {
        return Ok(LoadReport::default());
    }
    let document: BTreeMap<String, Value> = serde_json::from_str(contents)?;

    let mut report = LoadReport::default();
    for (raw_key, value) in document {
        match decode_record(&raw_key, value, default_interval) {
            Ok((key, record)) => {
                report.records.insert(key, record);
            }
            Err(reason) => report.skipped.push(MalformedRecord {
                key: raw_key,
                reason,
            }),
        }
    }
    Ok(report)
}

fn decode_record(
    raw_key: &str,
    value: Value,
    default_interval: u32,
) -> Result<(LocationKey, ContainerRecord), String> {
    let key = LocationKey::parse(raw_key).map_err(|err| err.to_string())?;
    let stored: StoredRecord = serde_json::from_value(value).map_err(|err| err.to_string())?;
    for (index, slot) in stored.items.iter().enumerate() {
        if let Some(slot) = slot {
            slot.validate()
                .map_err(|err| format!("slot {index}: {err}"))?;
        }
    }

    Ok((
        key,
        ContainerRecord {
            template: stored.items,
            timer: stored.timer,
            restock_interval: stored.restock_time.unwrap_or(default_interval),
        },
    ))
}
