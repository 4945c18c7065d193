//! Color spaces the pipeline can histogram and threshold in.

use image::{Rgb, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Color representation of a three-channel 8-bit image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Decoded samples in legacy B, G, R channel order.
    Raw,
    /// 8-bit hue/saturation/value: H in 0..=180 (degrees halved), S and V in 0..=255.
    #[default]
    Hsv,
}

impl ColorSpace {
    pub fn all() -> [Self; 2] {
        [Self::Raw, Self::Hsv]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorSpace::Raw => "raw",
            ColorSpace::Hsv => "hsv",
        }
    }

    /// Returns `image` expressed in this color space as a new owned image.
    pub fn convert(&self, image: &RgbImage) -> RgbImage {
        match self {
            ColorSpace::Raw => rgb_image_to_bgr(image),
            ColorSpace::Hsv => rgb_image_to_hsv(image),
        }
    }
}

/// Converts one RGB sample to 8-bit HSV.
///
/// Hue is stored in half-degrees so the full circle fits into a byte.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = pixel.0.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0 {
        0.0
    } else {
        255.0 * delta as f32 / v as f32
    };

    let h = if delta == 0 {
        0.0
    } else {
        let delta = delta as f32;
        let degrees = if v == r {
            60.0 * (g - b) as f32 / delta
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / delta
        } else {
            240.0 + 60.0 * (r - g) as f32 / delta
        };
        if degrees < 0.0 {
            degrees + 360.0
        } else {
            degrees
        }
    };

    // 360 degrees rounds to 180 which wraps to 0.
    let h = ((h / 2.0).round() as i32 % 180) as u8;

    Rgb([h, s.round() as u8, v as u8])
}

/// Reverses the channel order so channel 0 holds blue.
pub fn rgb_image_to_bgr(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    out.par_chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
    out
}

pub fn rgb_image_to_hsv(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    out.par_chunks_exact_mut(3).for_each(|px| {
        let hsv = rgb_to_hsv(Rgb([px[0], px[1], px[2]]));
        px.copy_from_slice(&hsv.0);
    });
    out
}
