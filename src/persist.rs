//! Label-table persistence.
//!
//! The target table is the canonical artifact that makes trained-model label
//! ids interpretable later, so it is stored alongside model weights as a
//! JSON object keyed by decimal id. Loading reproduces ids exactly as saved.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::TargetSummary;
use crate::errors::DatasetError;
use crate::types::{Degrees, TargetName};

/// On-disk target entry, keyed externally by its decimal id.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedTarget {
    name: TargetName,
    lng: Degrees,
    lat: Degrees,
    frequency: f64,
}

/// Write the target table to `path` as a JSON object keyed by label id.
pub fn save_label_table(path: impl AsRef<Path>, targets: &[TargetSummary]) -> Result<(), DatasetError> {
    let map: BTreeMap<String, PersistedTarget> = targets
        .iter()
        .map(|summary| {
            (
                summary.id.to_string(),
                PersistedTarget {
                    name: summary.name.clone(),
                    lng: summary.lng,
                    lat: summary.lat,
                    frequency: summary.frequency,
                },
            )
        })
        .collect();
    let json = serde_json::to_string_pretty(&map)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a target table previously written by [`save_label_table`].
///
/// Entries are returned ordered by id. Non-numeric id keys are rejected.
pub fn load_label_table(path: impl AsRef<Path>) -> Result<Vec<TargetSummary>, DatasetError> {
    let text = fs::read_to_string(path)?;
    let map: BTreeMap<String, PersistedTarget> = serde_json::from_str(&text)?;
    let mut targets = Vec::with_capacity(map.len());
    for (key, entry) in map {
        let id = key
            .parse()
            .map_err(|_| DatasetError::LabelTable(format!("invalid label id key '{key}'")))?;
        targets.push(TargetSummary {
            id,
            name: entry.name,
            lng: entry.lng,
            lat: entry.lat,
            frequency: entry.frequency,
        });
    }
    targets.sort_by_key(|summary| summary.id);
    Ok(targets)
}
