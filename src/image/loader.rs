use crate::utils::error::VisionError;
use crate::Result;
use image::{GenericImageView, RgbImage};

const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;
const MAX_DIMENSION: u32 = 8192;

pub struct ImageLoader;

impl ImageLoader {
    /// Decodes an uploaded byte buffer into an RGB image.
    pub fn from_bytes(bytes: &[u8]) -> Result<RgbImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(VisionError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(image.dimensions())?;

        Ok(image.to_rgb8())
    }

    fn validate_dimensions((width, height): (u32, u32)) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidInput("Empty image".to_string()));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(VisionError::InvalidInput(format!(
                "Image too large: {}x{}, maximum {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }
        Ok(())
    }
}
