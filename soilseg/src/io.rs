use std::path::Path;

use image::{EncodableLayout, ImageBuffer, ImageFormat, Pixel, PixelWithColorType, RgbImage};

use crate::error::{Error, Result};

/// Decodes an image file into 8-bit RGB.
///
/// A buffer without pixels is an error rather than an empty pass.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let decoded = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.into_rgb8();
    ensure_not_empty(&image, path)?;

    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Loaded image"
    );
    Ok(image)
}

pub fn ensure_not_empty(image: &RgbImage, path: &Path) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage {
            path: path.to_path_buf(),
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

pub fn save_png<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, path: &Path) -> Result<()>
where
    P: Pixel + PixelWithColorType,
    [P::Subpixel]: EncodableLayout,
{
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}
