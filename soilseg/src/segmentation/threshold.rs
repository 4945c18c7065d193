use image::{GrayImage, Luma, RgbImage};
use rayon::prelude::*;

use crate::config::ChannelBounds;

/// Mask value of a pixel inside the range.
pub const MASK_ON: u8 = 255;

/// Sets a mask pixel iff every channel lies in `[lower, upper]`, inclusive.
///
/// Inverted bounds select nothing.
pub fn in_range(image: &RgbImage, lower: ChannelBounds, upper: ChannelBounds) -> GrayImage {
    let lo = lower.as_array();
    let hi = upper.as_array();
    let mut mask = GrayImage::new(image.width(), image.height());
    let samples: &mut [u8] = &mut mask;

    samples
        .par_iter_mut()
        .zip(image.as_raw().par_chunks_exact(3))
        .for_each(|(dst, px)| {
            let inside = px
                .iter()
                .zip(lo.iter().zip(hi.iter()))
                .all(|(&c, (&l, &h))| (l..=h).contains(&(c as i32)));
            *dst = if inside { MASK_ON } else { 0 };
        });

    mask
}

/// Number of set pixels in a mask.
pub fn count_set(mask: &GrayImage) -> usize {
    mask.pixels().filter(|&&Luma([v])| v != 0).count()
}
