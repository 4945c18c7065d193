//! Region boundaries with nesting, reduced to their corner points.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Whether a boundary encloses set pixels or a hole inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Outer,
    Hole,
}

/// One closed boundary of a mask component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Direction-change points in traversal order; the last connects back to the first.
    pub points: Vec<Point<i32>>,
    pub kind: BoundaryKind,
    /// Index of the enclosing boundary in the same extraction, if any.
    pub parent: Option<usize>,
}

/// Extracts every outer and hole boundary of the set pixels of `mask`.
///
/// Parent indices refer to positions in the returned vector, so the result
/// describes the full nesting tree.
pub fn extract_boundaries(mask: &GrayImage) -> Vec<Boundary> {
    // A blank frame keeps regions touching the image edge closed.
    let (width, height) = mask.dimensions();
    let padded = GrayImage::from_fn(width + 2, height + 2, |x, y| {
        if x == 0 || y == 0 || x > width || y > height {
            Luma([0])
        } else {
            *mask.get_pixel(x - 1, y - 1)
        }
    });

    find_contours::<i32>(&padded)
        .into_iter()
        .map(|contour| {
            let points: Vec<Point<i32>> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            Boundary {
                points: simplify_chain(&points),
                kind: match contour.border_type {
                    BorderType::Outer => BoundaryKind::Outer,
                    BorderType::Hole => BoundaryKind::Hole,
                },
                parent: contour.parent,
            }
        })
        .collect()
}

#[inline]
fn step(from: Point<i32>, to: Point<i32>) -> (i32, i32) {
    ((to.x - from.x).signum(), (to.y - from.y).signum())
}

/// Drops every point that continues a straight horizontal, vertical or
/// diagonal run, keeping only the run end points of the closed chain.
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let simplified: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            step(prev, curr) != step(curr, next)
        })
        .map(|i| points[i])
        .collect();

    if simplified.is_empty() {
        vec![points[0]]
    } else {
        simplified
    }
}
