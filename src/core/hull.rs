//! Planar convex hull and point containment.

/// Convex hull in counter-clockwise order (Andrew's monotone chain).
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    vertices: Vec<(f64, f64)>,
    tolerance: f64,
}

#[inline]
fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

impl ConvexHull {
    /// Non-finite points are ignored. Collinear points on the boundary are dropped.
    pub fn new(points: &[(f64, f64)]) -> Self {
        let mut pts: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pts.dedup();

        let scale = pts
            .iter()
            .fold(1.0_f64, |m, (x, y)| m.max(x.abs()).max(y.abs()));
        let tolerance = 1e-9 * scale;

        if pts.len() < 3 {
            return Self {
                vertices: pts,
                tolerance,
            };
        }

        let mut lower: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
        for &p in &pts {
            while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<(f64, f64)> = Vec::with_capacity(pts.len());
        for &p in pts.iter().rev() {
            while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);

        Self {
            vertices: lower,
            tolerance,
        }
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Boundary points count as inside, up to a small relative tolerance.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        if !(p.0.is_finite() && p.1.is_finite()) {
            return false;
        }
        match self.vertices.len() {
            0 => false,
            1 => {
                let v = self.vertices[0];
                (p.0 - v.0).hypot(p.1 - v.1) <= self.tolerance
            }
            2 => self.on_segment(self.vertices[0], self.vertices[1], p),
            n => (0..n).all(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                let len = (b.0 - a.0).hypot(b.1 - a.1);
                cross(a, b, p) >= -self.tolerance * len
            }),
        }
    }

    fn on_segment(&self, a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
        let len = (b.0 - a.0).hypot(b.1 - a.1);
        if cross(a, b, p).abs() > self.tolerance * len {
            return false;
        }
        let t = ((p.0 - a.0) * (b.0 - a.0) + (p.1 - a.1) * (b.1 - a.1)) / (len * len);
        let slack = self.tolerance / len;
        (-slack..=1.0 + slack).contains(&t)
    }
}
