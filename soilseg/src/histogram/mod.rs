//! Per-channel intensity histograms and the features derived from them.
//!
//! A [`ColorHistogram`] holds one 256-bin [`Histogram`] per channel of an
//! image expressed in a given [`ColorSpace`]. Bin counts are exact; the
//! display-normalized form is derived on demand.

mod plot;
mod summary;


use image::RgbImage;
use rayon::prelude::*;

use crate::color::ColorSpace;

pub use plot::{render_histogram_plot, PLOT_HEIGHT, PLOT_WIDTH};
pub use summary::{average, FeatureVector, MeanSource, FEATURE_COUNT};

/// Number of uniform bins covering `[0, 256)`.
pub const BIN_COUNT: usize = 256;

/// Upper end of the display range histograms are rescaled into.
pub const DISPLAY_MAX: f32 = 400.0;

/// Pixels per parallel work item.
const CHUNK_PIXELS: usize = 16 * 1024;

/// Sample counts of a single 8-bit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u32; BIN_COUNT],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: [0; BIN_COUNT],
        }
    }
}

impl Histogram {
    pub fn from_bins(bins: [u32; BIN_COUNT]) -> Self {
        Self { bins }
    }

    #[inline]
    pub fn bins(&self) -> &[u32; BIN_COUNT] {
        &self.bins
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&c| c as u64).sum()
    }

    /// Bins min-max rescaled into `[0, max]`.
    ///
    /// A histogram whose bins are all equal maps to all zeros.
    pub fn normalized(&self, max: f32) -> [f32; BIN_COUNT] {
        let lo = *self.bins.iter().min().unwrap_or(&0) as f32;
        let hi = *self.bins.iter().max().unwrap_or(&0) as f32;
        let scale = if hi - lo > f32::EPSILON {
            max / (hi - lo)
        } else {
            0.0
        };

        let mut out = [0.0f32; BIN_COUNT];
        for (dst, &count) in out.iter_mut().zip(self.bins.iter()) {
            *dst = (count as f32 - lo) * scale;
        }
        out
    }

    /// Bins rescaled into the plot range `[0, DISPLAY_MAX]`.
    pub fn display(&self) -> [f32; BIN_COUNT] {
        self.normalized(DISPLAY_MAX)
    }

    /// Count-weighted mean sample value, 0 for an empty histogram.
    pub fn mean_intensity(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * count as u64)
            .sum();
        (weighted as f64 / total as f64) as f32
    }

    fn merge(mut self, other: &Self) -> Self {
        for (a, b) in self.bins.iter_mut().zip(other.bins.iter()) {
            *a += b;
        }
        self
    }
}

/// Three channel histograms of one image in one color space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHistogram {
    space: ColorSpace,
    channels: [Histogram; 3],
}

impl ColorHistogram {
    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn channels(&self) -> &[Histogram; 3] {
        &self.channels
    }

    /// Histogram of channel `index`, `None` past the third channel.
    pub fn channel(&self, index: usize) -> Option<&Histogram> {
        self.channels.get(index)
    }

    /// Display-normalized copy of every channel.
    pub fn display(&self) -> [[f32; BIN_COUNT]; 3] {
        [
            self.channels[0].display(),
            self.channels[1].display(),
            self.channels[2].display(),
        ]
    }
}

/// Counts the samples of each channel of `image` after converting it to `space`.
pub fn build(image: &RgbImage, space: ColorSpace) -> ColorHistogram {
    let converted = space.convert(image);

    let channels = converted
        .as_raw()
        .par_chunks(CHUNK_PIXELS * 3)
        .map(|chunk| {
            let mut local: [Histogram; 3] = Default::default();
            for px in chunk.chunks_exact(3) {
                for (hist, &sample) in local.iter_mut().zip(px.iter()) {
                    hist.bins[sample as usize] += 1;
                }
            }
            local
        })
        .reduce(
            Default::default,
            |[a0, a1, a2], [b0, b1, b2]| [a0.merge(&b0), a1.merge(&b1), a2.merge(&b2)],
        );

    tracing::debug!(
        space = space.name(),
        pixels = channels[0].total(),
        "Built color histogram"
    );

    ColorHistogram { space, channels }
}
