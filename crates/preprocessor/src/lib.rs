//! Image Preprocessor
//!
//! Converts an uploaded image into the fixed-shape, normalized tensor the
//! pretrained network expects. The pipeline is a fixed policy matching the
//! training-time transform and is deliberately not configurable.

mod transform;

pub use transform::{
    preprocess, tensor_from_image, CHANNEL_MEAN, CHANNEL_STD, CROP_SIZE, RESIZE_SHORTER_SIDE,
};

use thiserror::Error;

/// Errors during image preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The uploaded bytes are not a decodable image. Client-caused.
    #[error("failed to decode image: {0}")]
    Decode(String),
}
