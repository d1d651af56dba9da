//! Raw record source interfaces and built-in implementations.
//!
//! Ownership model: a source produces owned `PlaceRecord`s; the caller keys
//! them into a `Dataset`, after which the source plays no further part.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::{Dataset, PlaceRecord};
use crate::errors::DatasetError;
use crate::types::{Degrees, RecordKey, SourceId, TargetName};

/// Supplier of raw labeled records.
///
/// Implementations must provide, per record, at minimum the key, a signed
/// decimal-degree coordinate, and a non-empty target label.
pub trait RecordSource {
    /// Stable source identifier used in error reporting.
    fn id(&self) -> &str;
    /// Produce the full record collection.
    fn load(&self) -> Result<Vec<PlaceRecord>, DatasetError>;
}

impl Dataset {
    /// Build a dataset by draining a record source.
    pub fn from_source(source: &dyn RecordSource) -> Result<Dataset, DatasetError> {
        Ok(Dataset::from_records(source.load()?))
    }
}

/// In-memory record source for tests and small corpora.
pub struct InMemorySource {
    id: SourceId,
    records: Vec<PlaceRecord>,
}

impl InMemorySource {
    /// Create an in-memory source from prebuilt records.
    pub fn new(id: impl Into<SourceId>, records: Vec<PlaceRecord>) -> Self {
        Self {
            id: id.into(),
            records,
        }
    }
}

impl RecordSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Vec<PlaceRecord>, DatasetError> {
        Ok(self.records.clone())
    }
}

/// On-disk raw place entry: the JSON value stored per record key.
#[derive(Debug, Deserialize)]
struct RawPlace {
    lng: Degrees,
    lat: Degrees,
    target: TargetName,
}

/// Record source reading a single JSON object file mapping each record key
/// to its `{lng, lat, target}` entry.
pub struct JsonFileSource {
    id: SourceId,
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading from `path`. The file name doubles as the
    /// source id.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { id, path }
    }

    /// The file this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Vec<PlaceRecord>, DatasetError> {
        let text = fs::read_to_string(&self.path).map_err(|error| {
            DatasetError::SourceUnavailable {
                source_id: self.id.clone(),
                reason: error.to_string(),
            }
        })?;
        let raw: BTreeMap<RecordKey, RawPlace> = serde_json::from_str(&text)?;
        Ok(raw
            .into_iter()
            .map(|(key, place)| PlaceRecord {
                key,
                lng: place.lng,
                lat: place.lat,
                target: place.target,
                image: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn in_memory_source_round_trips_records() {
        let source = InMemorySource::new(
            "unit",
            vec![PlaceRecord {
                key: "a".into(),
                lng: 1.0,
                lat: 2.0,
                target: "X".into(),
                image: None,
            }],
        );
        let dataset = Dataset::from_source(&source).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()["a"].target, "X");
    }

    #[test]
    fn json_file_source_parses_keyed_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pano_a": {{"lng": 121.47, "lat": 31.23, "target": "Shanghai"}},
                "pano_b": {{"lng": 139.69, "lat": 35.69, "target": "Tokyo"}}}}"#
        )
        .unwrap();
        let source = JsonFileSource::new(file.path());
        let dataset = Dataset::from_source(&source).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()["pano_a"].target, "Shanghai");
        assert_eq!(dataset.records()["pano_b"].lat, 35.69);
        assert_eq!(dataset.targets().len(), 2);
    }

    #[test]
    fn missing_file_reports_source_unavailable() {
        let source = JsonFileSource::new("/nonexistent/records.json");
        let err = Dataset::from_source(&source).unwrap_err();
        assert!(matches!(err, DatasetError::SourceUnavailable { .. }));
    }
}
