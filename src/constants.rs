/// Constants used by great-circle distance computation.
pub mod geo {
    /// Mean Earth radius in kilometers used by the haversine formula.
    pub const EARTH_RADIUS_KM: f64 = 6371.0;
}

/// Constants used by target-table consolidation.
pub mod consolidate {
    /// Decimal digits kept for centroid components and frequencies.
    pub const SUMMARY_ROUND_DECIMALS: i32 = 5;
}

/// Constants used by label-set cleansing.
pub mod cleanse {
    /// Default merge-distance budget for reassigning non-kept labels.
    pub const DEFAULT_MAX_MERGE_DISTANCE_KM: f64 = 1000.0;
}

/// Constants used by the image sample pipeline.
pub mod sampler {
    /// Default extension appended to record keys when locating image files.
    pub const DEFAULT_IMAGE_EXT: &str = ".jpg";
    /// Edge length of the square model-input resolution.
    pub const SAMPLE_EDGE: u32 = 224;
    /// Per-channel normalization means (ImageNet statistics).
    pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    /// Per-channel normalization standard deviations (ImageNet statistics).
    pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
}
