//! Derives the canonical target table from a raw record collection.
//!
//! Grouping is by exact string equality of the record's target. Centroids are
//! the arithmetic mean of member coordinates in degrees, not geodesically
//! corrected; downstream artifacts depend on this exact behavior.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::constants::consolidate::SUMMARY_ROUND_DECIMALS;
use crate::data::{PlaceRecord, TargetSummary};
use crate::types::{RecordKey, TargetName};

/// Build a target table from a keyed record collection.
///
/// Ids are assigned by lexicographic rank of the target name, so the result
/// is identical for any iteration order of the same records. An empty
/// collection yields an empty table.
pub fn consolidate(records: &IndexMap<RecordKey, PlaceRecord>) -> Vec<TargetSummary> {
    let mut groups: BTreeMap<&TargetName, Vec<&PlaceRecord>> = BTreeMap::new();
    for record in records.values() {
        groups.entry(&record.target).or_default().push(record);
    }
    let total = records.len();
    groups
        .into_iter()
        .enumerate()
        .map(|(id, (name, members))| {
            let count = members.len() as f64;
            let avg_lng = members.iter().map(|record| record.lng).sum::<f64>() / count;
            let avg_lat = members.iter().map(|record| record.lat).sum::<f64>() / count;
            TargetSummary {
                id,
                name: name.clone(),
                lng: round_summary(avg_lng),
                lat: round_summary(avg_lat),
                frequency: round_summary(count / total as f64),
            }
        })
        .collect()
}

/// Round a derived summary value to the canonical digit count.
pub(crate) fn round_summary(value: f64) -> f64 {
    let scale = 10f64.powi(SUMMARY_ROUND_DECIMALS);
    (value * scale).round() / scale
}
