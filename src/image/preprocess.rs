//! Tensor conversion for the two model families.

use image::{imageops, RgbImage};
use ndarray::Array4;

/// Per-channel normalization constants the classifier was trained with.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resizes to the detector's square input and scales pixels to [0, 1],
/// NCHW with batch dimension.
pub fn detector_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(image, size, size, imageops::FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Resizes to the classifier's square input and applies per-channel
/// mean/standard-deviation normalization, NCHW with batch dimension.
pub fn classifier_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(image, size, size, imageops::FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    tensor
}
