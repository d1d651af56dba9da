//! Bounds the label set to the top-K most frequent targets.
//!
//! Records whose label is not retained are reassigned to the nearest kept
//! centroid, or dropped when that centroid is farther than the merge budget.
//! The result is always a fresh dataset; the source is never mutated.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::constants::cleanse::DEFAULT_MAX_MERGE_DISTANCE_KM;
use crate::data::{Dataset, TargetSummary};
use crate::geo::distance_km;
use crate::types::Kilometers;

impl Dataset {
    /// Cleanse with the default merge-distance budget.
    pub fn cleanse_top_k(&self, keep_top_k: usize) -> Dataset {
        self.cleanse(keep_top_k, DEFAULT_MAX_MERGE_DISTANCE_KM)
    }

    /// Produce a new dataset whose label set is bounded to `keep_top_k`.
    ///
    /// The kept set is the top-K summaries ranked by frequency descending,
    /// ties broken by ascending label id. Records already carrying a kept
    /// label pass through unchanged. Every other record is assigned the
    /// nearest kept centroid (ties resolved by kept-set ranking order) and
    /// dropped when that distance exceeds `max_merge_distance_km`.
    ///
    /// The returned dataset's target table is recomputed from scratch, so
    /// frequencies reflect reassigned membership and label ids may differ
    /// from the input's. `keep_top_k = 0` drops every record; a `keep_top_k`
    /// at or above the distinct-label count leaves every assignment intact.
    /// The operation never fails.
    pub fn cleanse(&self, keep_top_k: usize, max_merge_distance_km: Kilometers) -> Dataset {
        let mut kept: Vec<&TargetSummary> = self.targets().iter().collect();
        kept.sort_by(|a, b| {
            b.frequency
                .total_cmp(&a.frequency)
                .then(a.id.cmp(&b.id))
        });
        kept.truncate(keep_top_k);
        let kept_names: HashSet<&str> = kept.iter().map(|summary| summary.name.as_str()).collect();

        let mut records = IndexMap::with_capacity(self.len());
        for (key, record) in self.records() {
            if kept_names.contains(record.target.as_str()) {
                records.insert(key.clone(), record.clone());
                continue;
            }
            let mut nearest: Option<(&TargetSummary, Kilometers)> = None;
            for &summary in &kept {
                let distance = distance_km(record.lng, record.lat, summary.lng, summary.lat);
                // Strict comparison: the first kept entry in ranking order
                // wins distance ties.
                if nearest.map(|(_, best)| distance < best).unwrap_or(true) {
                    nearest = Some((summary, distance));
                }
            }
            let Some((summary, distance)) = nearest else {
                // Empty kept set: no merge candidate exists.
                continue;
            };
            if distance > max_merge_distance_km {
                debug!(
                    key = %key,
                    target = %record.target,
                    distance_km = distance,
                    "dropping record beyond merge distance"
                );
                continue;
            }
            let mut merged = record.clone();
            merged.target = summary.name.clone();
            records.insert(key.clone(), merged);
        }
        Dataset::new(records)
    }
}
