use serde::{Deserialize, Serialize};

use super::{ColorHistogram, Histogram};
use crate::color::ColorSpace;

pub const FEATURE_COUNT: usize = 6;

/// Which values a channel mean is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanSource {
    /// Mean of the display-normalized bins (legacy).
    #[default]
    DisplayNormalized,
    /// Mean of the raw bin counts (always `pixels / 256`).
    BinCounts,
    /// Count-weighted mean sample value of the channel.
    Intensity,
}

/// Arithmetic mean of a channel's bin values.
pub fn average(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

impl Histogram {
    pub fn mean(&self, source: MeanSource) -> f32 {
        match source {
            MeanSource::DisplayNormalized => average(&self.display()),
            MeanSource::BinCounts => {
                let counts: Vec<f32> = self.bins().iter().map(|&c| c as f32).collect();
                average(&counts)
            }
            MeanSource::Intensity => self.mean_intensity(),
        }
    }
}

/// Six channel means: raw B, G, R first, then H, S, V.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector(pub [f32; FEATURE_COUNT]);

impl FeatureVector {
    pub fn from_histograms(raw: &ColorHistogram, hsv: &ColorHistogram, source: MeanSource) -> Self {
        debug_assert_eq!(raw.space(), ColorSpace::Raw);
        debug_assert_eq!(hsv.space(), ColorSpace::Hsv);

        let mut values = [0.0f32; FEATURE_COUNT];
        for (dst, hist) in values
            .iter_mut()
            .zip(raw.channels().iter().chain(hsv.channels().iter()))
        {
            *dst = hist.mean(source);
        }
        Self(values)
    }

    pub fn values(&self) -> &[f32; FEATURE_COUNT] {
        &self.0
    }
}
