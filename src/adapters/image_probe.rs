use crate::domain::model::ImageSize;
use crate::domain::ports::ImageProbe;
use crate::utils::error::{DeckError, Result};
use image::ImageReader;
use std::path::Path;

/// Reads dimensions from the image header only.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageProbe;

impl ImageProbe for FileImageProbe {
    fn dimensions(&self, path: &Path) -> Result<ImageSize> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()?;

        if width == 0 || height == 0 {
            return Err(DeckError::UnsupportedImage {
                path: path.to_path_buf(),
            });
        }
        Ok(ImageSize::new(width, height))
    }
}
