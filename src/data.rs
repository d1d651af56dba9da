use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::consolidate::consolidate;
use crate::types::{Degrees, LabelId, RecordKey, TargetName};

/// One raw labeled observation: a panorama key, its coordinate, its place
/// label, and (after loading) the binary image payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Unique record key (also the image filename stem).
    pub key: RecordKey,
    /// Longitude in signed decimal degrees.
    pub lng: Degrees,
    /// Latitude in signed decimal degrees.
    pub lat: Degrees,
    /// Ground-truth place label.
    pub target: TargetName,
    /// Raw image payload, attached only after a successful load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
}

/// A consolidated target label: dense id, name, centroid, and frequency.
///
/// Ids are the 0-based rank of the label name in lexicographic sort order,
/// so recomputing from the same label set always yields the same ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Dense label id (lexicographic rank of `name`).
    pub id: LabelId,
    /// Target place name.
    pub name: TargetName,
    /// Centroid longitude, the arithmetic mean of member longitudes.
    pub lng: Degrees,
    /// Centroid latitude, the arithmetic mean of member latitudes.
    pub lat: Degrees,
    /// Member count over total record count.
    pub frequency: f64,
}

/// A keyed record collection paired with its consolidated target table.
///
/// Ownership model: a dataset owns its records and target table exclusively.
/// Derived datasets (after cleansing) are fresh, independent objects; no
/// transformation aliases mutable state with its source.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: IndexMap<RecordKey, PlaceRecord>,
    targets: Vec<TargetSummary>,
}

impl Dataset {
    /// Build a dataset from a keyed record collection, consolidating the
    /// target table from scratch.
    pub fn new(records: IndexMap<RecordKey, PlaceRecord>) -> Self {
        let targets = consolidate(&records);
        Self { records, targets }
    }

    /// Build a dataset with an explicit, precomputed target table.
    pub fn with_targets(
        records: IndexMap<RecordKey, PlaceRecord>,
        targets: Vec<TargetSummary>,
    ) -> Self {
        Self { records, targets }
    }

    /// Build a dataset from unkeyed records, keying each by its own `key`.
    /// A later record with a duplicate key replaces the earlier one.
    pub fn from_records(records: impl IntoIterator<Item = PlaceRecord>) -> Self {
        let mut keyed = IndexMap::new();
        for record in records {
            keyed.insert(record.key.clone(), record);
        }
        Self::new(keyed)
    }

    /// The keyed record collection. Iteration order is stable across
    /// repeated enumeration, which index arithmetic relies on.
    pub fn records(&self) -> &IndexMap<RecordKey, PlaceRecord> {
        &self.records
    }

    /// The consolidated target table, ordered by label id.
    pub fn targets(&self) -> &[TargetSummary] {
        &self.targets
    }

    /// Number of records in the collection.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the label id for a target name, if present in the table.
    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.targets
            .iter()
            .find(|summary| summary.name == name)
            .map(|summary| summary.id)
    }

    /// Look up the target name for a label id, if present in the table.
    pub fn label_name(&self, id: LabelId) -> Option<&str> {
        self.targets
            .iter()
            .find(|summary| summary.id == id)
            .map(|summary| summary.name.as_str())
    }
}
