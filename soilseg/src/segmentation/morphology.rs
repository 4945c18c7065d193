//! Erosion and dilation with elliptical structuring elements.

use image::GrayImage;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// A square structuring element with an inscribed ellipse, anchored at its center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    size: usize,
    /// Offsets (dx, dy) of the set cells relative to the anchor.
    offsets: Vec<(isize, isize)>,
}

impl StructuringElement {
    /// Builds the ellipse inscribed in a `size` x `size` box.
    ///
    /// Size 0 is rejected.
    pub fn ellipse(size: i32) -> Result<Self> {
        if size < 1 {
            return Err(Error::InvalidConfig {
                field: "structuring_element",
                value: size as i64,
                reason: "size must be >= 1",
            });
        }
        let size = size as usize;
        let r = (size / 2) as isize;
        let c = (size / 2) as isize;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

        let mut offsets = Vec::new();
        for i in 0..size as isize {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as isize;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(size as isize);
            for j in j1..j2 {
                offsets.push((j - c, i - r));
            }
        }

        Ok(Self { size, offsets })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether cell (col, row) of the box is part of the element.
    pub fn contains(&self, col: usize, row: usize) -> bool {
        let anchor = (self.size / 2) as isize;
        self.offsets
            .contains(&(col as isize - anchor, row as isize - anchor))
    }

    fn is_identity(&self) -> bool {
        self.offsets == [(0, 0)]
    }
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

fn apply(mask: &GrayImage, element: &StructuringElement, op: Op) -> GrayImage {
    if element.is_identity() {
        return mask.clone();
    }

    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let src = mask.as_raw();
    let mut out = GrayImage::new(mask.width(), mask.height());
    if width == 0 || height == 0 {
        return out;
    }

    // Neighbors outside the image are skipped, so borders neither erode nor grow.
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, dst) in row.iter_mut().enumerate() {
            let mut acc = match op {
                Op::Erode => u8::MAX,
                Op::Dilate => u8::MIN,
            };
            for &(dx, dy) in &element.offsets {
                let sx = x as isize + dx;
                let sy = y as isize + dy;
                if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                    continue;
                }
                let v = src[sy as usize * width + sx as usize];
                acc = match op {
                    Op::Erode => acc.min(v),
                    Op::Dilate => acc.max(v),
                };
            }
            *dst = acc;
        }
    });

    out
}

/// Minimum over the element neighborhood.
pub fn erode(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    apply(mask, element, Op::Erode)
}

/// Maximum over the element neighborhood.
pub fn dilate(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    apply(mask, element, Op::Dilate)
}
