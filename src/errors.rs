use std::io;

use thiserror::Error;

use crate::types::{RecordKey, SourceId};

/// Error type for record sources, sample resolution, and persistence failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("record source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },
    #[error("sample index {index} is out of bounds for virtual length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("failed to decode image payload for record '{key}'")]
    ImageDecode {
        key: RecordKey,
        #[source]
        source: image::ImageError,
    },
    #[error("label table error: {0}")]
    LabelTable(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
