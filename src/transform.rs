//! Per-sample image pipeline: decode, blank trim, crop variants, resize,
//! and tensor normalization.
//!
//! Every step is pure given its inputs, so resolved samples may be computed
//! from any number of threads once the underlying dataset is frozen.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::constants::sampler::{IMAGENET_MEAN, IMAGENET_STD};
use crate::errors::DatasetError;
use crate::types::RecordKey;

/// A normalized CHW float tensor produced from one sample image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTensor {
    /// Number of channels (3 for the standard pipeline).
    pub channels: usize,
    /// Tensor height in pixels.
    pub height: usize,
    /// Tensor width in pixels.
    pub width: usize,
    /// Channel-major values, `channels * height * width` long.
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Tensor shape as `[channels, height, width]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    /// Value at `(channel, y, x)`.
    pub fn get(&self, channel: usize, y: usize, x: usize) -> f32 {
        self.data[channel * self.height * self.width + y * self.width + x]
    }
}

/// The fixed deterministic crop transforms applied per record.
///
/// The split axis follows whichever image dimension is longer, so panoramic
/// (landscape) images split left/right and portrait images split top/bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropVariant {
    /// Left half (landscape) or top half (portrait).
    FirstHalf,
    /// Right half (landscape) or bottom half (portrait).
    SecondHalf,
}

impl CropVariant {
    /// All variants, in the order index arithmetic cycles through them.
    pub const ALL: [CropVariant; 2] = [CropVariant::FirstHalf, CropVariant::SecondHalf];

    /// Number of variants (the augmentation arity).
    pub fn arity() -> usize {
        Self::ALL.len()
    }

    /// Apply this crop to an image. Images too small to halve are returned
    /// unchanged.
    pub fn apply(self, img: &DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width >= height {
            let half = width / 2;
            if half == 0 {
                return img.clone();
            }
            match self {
                CropVariant::FirstHalf => img.crop_imm(0, 0, half, height),
                CropVariant::SecondHalf => img.crop_imm(half, 0, width - half, height),
            }
        } else {
            let half = height / 2;
            if half == 0 {
                return img.clone();
            }
            match self {
                CropVariant::FirstHalf => img.crop_imm(0, 0, width, half),
                CropVariant::SecondHalf => img.crop_imm(0, half, width, height - half),
            }
        }
    }
}

/// Decode a stored binary payload into an image.
pub fn decode(key: &RecordKey, bytes: &[u8]) -> Result<DynamicImage, DatasetError> {
    image::load_from_memory(bytes).map_err(|source| DatasetError::ImageDecode {
        key: key.clone(),
        source,
    })
}

/// Trim the blank watermark/letterbox band from the bottom of an image.
///
/// Scans rows bottom-up over the grayscale image; the first row whose
/// leftmost and rightmost pixels are both non-zero bounds the real content,
/// and everything below it is cropped away. When no row qualifies the
/// original image is returned unchanged, a fail-safe rather than an error.
pub fn trim_bottom_blank(img: &DynamicImage) -> DynamicImage {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    for y in (0..height).rev() {
        let left = gray.get_pixel(0, y).0[0];
        let right = gray.get_pixel(width - 1, y).0[0];
        if left > 0 && right > 0 {
            return img.crop_imm(0, 0, width, y + 1);
        }
    }
    img.clone()
}

/// Convert an image to a normalized CHW tensor using the configured
/// per-channel statistics.
pub fn to_tensor(img: &DynamicImage) -> ImageTensor {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for channel in 0..3 {
            let value = pixel.0[channel] as f32 / 255.0;
            data[channel * plane + offset] =
                (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
        }
    }
    ImageTensor {
        channels: 3,
        height: height as usize,
        width: width as usize,
        data,
    }
}

/// Run the full per-sample pipeline: trim, crop, resize to a square edge,
/// and normalize.
pub fn prepare(img: &DynamicImage, variant: CropVariant, edge: u32) -> ImageTensor {
    let trimmed = trim_bottom_blank(img);
    let cropped = variant.apply(&trimmed);
    let resized = cropped.resize_exact(edge, edge, FilterType::Triangle);
    to_tensor(&resized)
}
