//! One full pass over an image: histogram features and tracked regions.
//!
//! The two halves never share intermediate data. Histograms depend only on
//! the image, so callers that re-run the segmentation with changing
//! parameters can compute them once.

use image::RgbImage;

use crate::color::ColorSpace;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::histogram::{self, ColorHistogram, FeatureVector, MeanSource};
use crate::segmentation::{self, SegmentationStages};
use crate::tracking::{self, TrackingResult};

/// Histograms of both color spaces and the means derived from them.
#[derive(Debug, Clone)]
pub struct HistogramSummary {
    pub raw: ColorHistogram,
    pub hsv: ColorHistogram,
    pub features: FeatureVector,
}

/// Segmentation stages and tracking outcome for one config snapshot.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub stages: SegmentationStages,
    pub tracking: TrackingResult,
}

impl PassOutput {
    pub fn region_count(&self) -> usize {
        self.tracking.count
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub histograms: HistogramSummary,
    pub pass: PassOutput,
}

impl Analysis {
    pub fn region_count(&self) -> usize {
        self.pass.region_count()
    }

    pub fn features(&self) -> &FeatureVector {
        &self.histograms.features
    }
}

/// Runs the histogram and segmentation halves over an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer {
    mean_source: MeanSource,
}

impl Analyzer {
    pub fn new(mean_source: MeanSource) -> Self {
        Self { mean_source }
    }

    pub fn mean_source(&self) -> MeanSource {
        self.mean_source
    }

    pub fn summarize(&self, image: &RgbImage) -> HistogramSummary {
        let raw = histogram::build(image, ColorSpace::Raw);
        let hsv = histogram::build(image, ColorSpace::Hsv);
        let features = FeatureVector::from_histograms(&raw, &hsv, self.mean_source);

        HistogramSummary { raw, hsv, features }
    }

    /// Segments `image` and tracks regions on a copy of it.
    pub fn run_pass(&self, image: &RgbImage, config: &PipelineConfig) -> Result<PassOutput> {
        let stages = segmentation::segment_stages(image, config)?;
        let tracking = tracking::track(
            stages.mask(),
            image.clone(),
            config.area_min,
            config.area_max,
        );

        Ok(PassOutput { stages, tracking })
    }

    pub fn analyze(&self, image: &RgbImage, config: &PipelineConfig) -> Result<Analysis> {
        let pass = self.run_pass(image, config)?;
        let histograms = self.summarize(image);

        Ok(Analysis { histograms, pass })
    }
}
