//! Tunable parameters for one processing pass.
//!
//! [`PipelineConfig`] is a plain value: the controller owns and edits it,
//! every pass works on its own copy.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::ColorSpace;
use crate::error::{Error, Result};

/// Inclusive per-channel bounds for the range threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelBounds {
    pub h: i32,
    pub s: i32,
    pub v: i32,
}

impl ChannelBounds {
    pub fn new(h: i32, s: i32, v: i32) -> Self {
        Self { h, s, v }
    }

    pub fn as_array(&self) -> [i32; 3] {
        [self.h, self.s, self.v]
    }
}

/// Parameters of the segmentation chain and the region area filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Blur radius; the kernel is `2 * blur_radius + 1` wide.
    pub blur_radius: i32,
    /// Color space the blurred image is compared in.
    pub threshold_space: ColorSpace,
    /// Elliptical structuring element size for the erosion.
    pub erode_size: i32,
    /// Elliptical structuring element size for the dilation.
    pub dilate_size: i32,
    /// Regions must be strictly larger than this.
    pub area_min: i32,
    /// Regions must be strictly smaller than this.
    pub area_max: i32,
    // Tables last so the TOML form stays valid.
    pub lower: ChannelBounds,
    pub upper: ChannelBounds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_radius: 1,
            lower: ChannelBounds::default(),
            upper: ChannelBounds::default(),
            threshold_space: ColorSpace::Hsv,
            erode_size: 1,
            dilate_size: 1,
            area_min: 1,
            area_max: 1,
        }
    }
}

/// Slider ranges of the calibration controls.
#[derive(Debug, Clone)]
pub struct ParamLimits {
    pub blur_radius: RangeInclusive<i32>,
    pub bound: RangeInclusive<i32>,
    pub erode_size: RangeInclusive<i32>,
    pub dilate_size: RangeInclusive<i32>,
    pub area_min: RangeInclusive<i32>,
    pub area_max: RangeInclusive<i32>,
}

impl Default for ParamLimits {
    fn default() -> Self {
        Self {
            blur_radius: 0..=20,
            bound: 0..=255,
            erode_size: 1..=20,
            dilate_size: 1..=20,
            area_min: 0..=25,
            area_max: 0..=1000,
        }
    }
}

fn clamp_to(value: i32, range: &RangeInclusive<i32>) -> i32 {
    value.clamp(*range.start(), *range.end())
}

impl PipelineConfig {
    /// Kernel width of the blur stage.
    pub fn blur_kernel_size(&self) -> usize {
        2 * self.blur_radius.max(0) as usize + 1
    }

    pub fn with_bounds(mut self, lower: ChannelBounds, upper: ChannelBounds) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_area_range(mut self, area_min: i32, area_max: i32) -> Self {
        self.area_min = area_min;
        self.area_max = area_max;
        self
    }

    /// Checks the values the pipeline cannot run with.
    ///
    /// Bounds may be inverted (that yields an empty mask) and the area range
    /// is unrestricted; only the kernel sizes and the byte range of the
    /// bounds are enforced.
    pub fn validate(&self) -> Result<()> {
        if self.blur_radius < 0 {
            return Err(Error::InvalidConfig {
                field: "blur_radius",
                value: self.blur_radius as i64,
                reason: "must be >= 0",
            });
        }
        if self.erode_size < 1 {
            return Err(Error::InvalidConfig {
                field: "erode_size",
                value: self.erode_size as i64,
                reason: "structuring element must be >= 1",
            });
        }
        if self.dilate_size < 1 {
            return Err(Error::InvalidConfig {
                field: "dilate_size",
                value: self.dilate_size as i64,
                reason: "structuring element must be >= 1",
            });
        }

        let bounds = [
            ("lower.h", self.lower.h),
            ("lower.s", self.lower.s),
            ("lower.v", self.lower.v),
            ("upper.h", self.upper.h),
            ("upper.s", self.upper.s),
            ("upper.v", self.upper.v),
        ];
        for (field, value) in bounds {
            if !(0..=255).contains(&value) {
                return Err(Error::InvalidConfig {
                    field,
                    value: value as i64,
                    reason: "must be within 0..=255",
                });
            }
        }

        Ok(())
    }

    /// Returns a copy with every parameter moved into `limits`.
    pub fn clamped(&self, limits: &ParamLimits) -> Self {
        let clamp_bounds = |b: ChannelBounds| ChannelBounds {
            h: clamp_to(b.h, &limits.bound),
            s: clamp_to(b.s, &limits.bound),
            v: clamp_to(b.v, &limits.bound),
        };

        Self {
            blur_radius: clamp_to(self.blur_radius, &limits.blur_radius),
            lower: clamp_bounds(self.lower),
            upper: clamp_bounds(self.upper),
            threshold_space: self.threshold_space,
            erode_size: clamp_to(self.erode_size, &limits.erode_size),
            dilate_size: clamp_to(self.dilate_size, &limits.dilate_size),
            area_min: clamp_to(self.area_min, &limits.area_min),
            area_max: clamp_to(self.area_max, &limits.area_max),
        }
    }

    /// Loads a YAML, JSON or TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        common::serde::load_file(path).map_err(|source| Error::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a config file and rejects values the pipeline cannot run with.
    ///
    /// Values are kept as written; area limits beyond the slider ranges of
    /// [`ParamLimits`] are legal.
    pub fn load_validated(path: &Path) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        common::serde::save_file(self, path).map_err(|source| Error::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })
    }
}
