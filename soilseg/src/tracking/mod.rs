//! Region extraction, area filtering and overlay annotation.
//!
//! # Algorithm
//!
//! 1. Trace every outer and hole boundary of the mask, with nesting, and
//!    keep only the direction-change points of each boundary.
//! 2. Compute polygon moments per boundary: area is `m00`, the centroid is
//!    `(m10 / m00, m01 / m00)`.
//! 3. Skip zero-area boundaries entirely.
//! 4. Accept a region iff `area_min < area < area_max`.
//! 5. Draw the outline and a centroid marker of each accepted region.
//!
//! The headline count is the number of extracted boundaries, accepted or not.

mod contours;
mod moments;


use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

pub use contours::{extract_boundaries, simplify_chain, Boundary, BoundaryKind};
pub use moments::Moments;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CENTROID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CENTROID_RADIUS: i32 = 1;

/// A boundary that passed the area filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Position among all extracted boundaries.
    pub index: usize,
    pub boundary: Boundary,
    pub area: f64,
    pub centroid: (f64, f64),
}

/// Outcome of one tracking pass.
#[derive(Debug, Clone)]
pub struct TrackingResult {
    /// Every extracted boundary, including rejected and zero-area ones.
    pub count: usize,
    pub accepted: Vec<Region>,
    pub overlay: RgbImage,
}

/// Area filter with both bounds excluded.
#[inline]
pub fn is_accepted(area: f64, area_min: i32, area_max: i32) -> bool {
    area > area_min as f64 && area < area_max as f64
}

/// Finds the regions of `mask`, filters them by area and annotates `overlay`.
pub fn track(mask: &GrayImage, overlay: RgbImage, area_min: i32, area_max: i32) -> TrackingResult {
    let mut overlay = overlay;
    let boundaries = extract_boundaries(mask);
    let count = boundaries.len();

    let mut accepted = Vec::new();
    for (index, boundary) in boundaries.into_iter().enumerate() {
        let moments = Moments::of_polygon(&boundary.points);
        let Some(centroid) = moments.centroid() else {
            continue;
        };
        let area = moments.area();
        if !is_accepted(area, area_min, area_max) {
            continue;
        }

        draw_region(&mut overlay, &boundary, centroid);
        accepted.push(Region {
            index,
            boundary,
            area,
            centroid,
        });
    }

    tracing::debug!(count, accepted = accepted.len(), "Tracked regions");

    TrackingResult {
        count,
        accepted,
        overlay,
    }
}

fn draw_region(overlay: &mut RgbImage, boundary: &Boundary, centroid: (f64, f64)) {
    let points = &boundary.points;
    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(
            overlay,
            (start.x as f32, start.y as f32),
            (end.x as f32, end.y as f32),
            OUTLINE_COLOR,
        );
    }

    let center = (centroid.0.round() as i32, centroid.1.round() as i32);
    draw_filled_circle_mut(overlay, center, CENTROID_RADIUS, CENTROID_COLOR);
}
