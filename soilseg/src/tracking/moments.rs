use imageproc::point::Point;

/// Zeroth and first-order spatial moments of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Green's theorem over the polygon edges.
    ///
    /// The sign is normalized so `m00` is the non-negative enclosed area
    /// whatever the traversal direction.
    pub fn of_polygon(points: &[Point<i32>]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0f64, 0.0f64, 0.0f64);
        let last = points[points.len() - 1];
        let (mut xp, mut yp) = (last.x as f64, last.y as f64);

        for p in points {
            let (x, y) = (p.x as f64, p.y as f64);
            let cross = xp * y - x * yp;
            a00 += cross;
            a10 += cross * (xp + x);
            a01 += cross * (yp + y);
            xp = x;
            yp = y;
        }

        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * a00 * 0.5,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.m00
    }

    /// `(m10 / m00, m01 / m00)`, or `None` for a zero-area polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}
