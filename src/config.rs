use crate::constants::sampler::{DEFAULT_IMAGE_EXT, SAMPLE_EDGE};

/// Configuration for the image sample stream.
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    /// Extension appended to a record key to form its image filename,
    /// including the leading dot.
    pub image_ext: String,
    /// Edge length of the square resolution samples are resized to.
    pub sample_edge: u32,
    /// Seed that controls deterministic epoch shuffles.
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            image_ext: DEFAULT_IMAGE_EXT.to_string(),
            sample_edge: SAMPLE_EDGE,
            seed: 42,
        }
    }
}
