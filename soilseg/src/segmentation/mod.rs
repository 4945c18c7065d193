//! Blur → range threshold → erode → dilate.
//!
//! Every stage produces a new owned image; the input is never modified.
//! The chain is fully determined by the image and the [`PipelineConfig`]
//! snapshot, so repeated runs produce byte-identical masks.

mod blur;
mod morphology;
mod threshold;

#[cfg(test)]
mod tests;

use image::{GrayImage, RgbImage};

use crate::config::PipelineConfig;
use crate::error::Result;

pub use blur::{auto_sigma, gaussian_blur, gaussian_kernel};
pub use morphology::{dilate, erode, StructuringElement};
pub use threshold::{count_set, in_range, MASK_ON};

/// Output of every stage of one segmentation pass.
#[derive(Debug, Clone)]
pub struct SegmentationStages {
    pub blurred: RgbImage,
    pub thresholded: GrayImage,
    pub eroded: GrayImage,
    pub dilated: GrayImage,
}

impl SegmentationStages {
    /// The cleaned mask handed to region tracking.
    pub fn mask(&self) -> &GrayImage {
        &self.dilated
    }
}

/// Runs the full chain and keeps each intermediate image.
pub fn segment_stages(image: &RgbImage, config: &PipelineConfig) -> Result<SegmentationStages> {
    config.validate()?;
    let erode_element = StructuringElement::ellipse(config.erode_size)?;
    let dilate_element = StructuringElement::ellipse(config.dilate_size)?;

    let blurred = gaussian_blur(image, config.blur_radius as usize);

    let compared = config.threshold_space.convert(&blurred);
    let thresholded = in_range(&compared, config.lower, config.upper);

    let eroded = erode(&thresholded, &erode_element);
    let dilated = dilate(&eroded, &dilate_element);

    tracing::debug!(
        kernel = config.blur_kernel_size(),
        space = config.threshold_space.name(),
        thresholded = count_set(&thresholded),
        eroded = count_set(&eroded),
        dilated = count_set(&dilated),
        "Segmented image"
    );

    Ok(SegmentationStages {
        blurred,
        thresholded,
        eroded,
        dilated,
    })
}

/// Returns the smoothed image and the cleaned mask.
pub fn segment(image: &RgbImage, config: &PipelineConfig) -> Result<(RgbImage, GrayImage)> {
    let stages = segment_stages(image, config)?;
    Ok((stages.blurred, stages.dilated))
}
