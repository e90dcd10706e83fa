//! The training-time transform pipeline

use crate::PreprocessError;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;
use tract_onnx::prelude::*;

/// Shorter side after the aspect-preserving resize
pub const RESIZE_SHORTER_SIDE: u32 = 256;

/// Side of the square center crop fed to the network
pub const CROP_SIZE: u32 = 224;

/// Per-channel RGB mean the network was trained with
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel RGB standard deviation the network was trained with
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode raw upload bytes and run the full transform.
///
/// Corrupt or unsupported bytes fail with [`PreprocessError::Decode`], which
/// the caller surfaces as a client error rather than a server fault.
pub fn preprocess(bytes: &[u8]) -> Result<Tensor, PreprocessError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| PreprocessError::Decode(e.to_string()))?;
    Ok(tensor_from_image(&decoded))
}

/// Transform a decoded image into the `(1, 3, 224, 224)` input tensor.
///
/// Steps, in training-pipeline order: convert to RGB, resize so the shorter
/// side is [`RESIZE_SHORTER_SIDE`], center-crop to [`CROP_SIZE`], scale to
/// `[0, 1]` in channel-first layout, normalize per channel, and add the
/// batch dimension.
pub fn tensor_from_image(image: &DynamicImage) -> Tensor {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!("Preprocessing {}x{} image", width, height);

    let (resized_w, resized_h) = resize_dimensions(width, height);
    let resized = image::imageops::resize(&rgb, resized_w, resized_h, FilterType::Triangle);

    let left = (resized_w - CROP_SIZE) / 2;
    let top = (resized_h - CROP_SIZE) / 2;
    let cropped = image::imageops::crop_imm(&resized, left, top, CROP_SIZE, CROP_SIZE).to_image();

    let side = CROP_SIZE as usize;
    tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let value = cropped[(x as u32, y as u32)][c] as f32 / 255.0;
        (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c]
    })
    .into()
}

/// Scale so the shorter side becomes [`RESIZE_SHORTER_SIDE`], preserving
/// aspect ratio. The longer side never ends up below the crop size.
fn resize_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= height {
        let scaled = (height as f64 * RESIZE_SHORTER_SIDE as f64 / width as f64).round() as u32;
        (RESIZE_SHORTER_SIDE, scaled.max(RESIZE_SHORTER_SIDE))
    } else {
        let scaled = (width as f64 * RESIZE_SHORTER_SIDE as f64 / height as f64).round() as u32;
        (scaled.max(RESIZE_SHORTER_SIDE), RESIZE_SHORTER_SIDE)
    }
}
