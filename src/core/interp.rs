//! Scattered interpolation of advected channel samples onto a dense grid.
//!
//! The default method is a thin-plate spline (`r^2 ln r` kernel plus an
//! affine term) fitted exactly through the samples. Dense points outside the
//! convex hull of the sample positions are set to exactly zero. When the
//! spline system is singular (fewer than three distinct, non-collinear
//! samples) the interpolant falls back to the nearest sample.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::PipelineError;
use crate::core::hull::ConvexHull;
use crate::core::util::linspace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpolationMethod {
    #[default]
    ThinPlate,
    Nearest,
}

/// Regular sample lattice covering a rectangle, stored row-major
/// (`[row * width + col]`, row along y).
#[derive(Clone, Debug, PartialEq)]
pub struct DenseGrid {
    width: usize,
    height: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl DenseGrid {
    /// `extent` is `(x_min, x_max, y_min, y_max)`, both ends inclusive.
    pub fn new(width: usize, height: usize, extent: (f64, f64, f64, f64)) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "grid resolution must be positive, got {width}x{height}"
            )));
        }
        let (x0, x1, y0, y1) = extent;
        Ok(Self {
            width,
            height,
            xs: linspace(x0, x1, width),
            ys: linspace(y0, y1, height),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Physical coordinate of dense cell `(col, row)`.
    #[inline]
    pub fn point(&self, col: usize, row: usize) -> (f64, f64) {
        (self.xs[col], self.ys[row])
    }
}

/// `r^2 ln r`, written in terms of `r^2`.
#[inline]
fn tps_kernel(r2: f64) -> f64 {
    if r2 <= 0.0 { 0.0 } else { 0.5 * r2 * r2.ln() }
}

/// Exact-fit thin-plate spline through scattered samples.
#[derive(Clone, Debug)]
pub struct ThinPlateSpline {
    centers: Vec<(f64, f64)>,
    weights: Vec<f64>,
    /// `a0 + a1 x + a2 y`
    affine: [f64; 3],
}

impl ThinPlateSpline {
    /// `None` when the linear system is singular.
    pub fn fit(points: &[(f64, f64)], values: &[f64]) -> Option<Self> {
        debug_assert_eq!(points.len(), values.len());
        let n = points.len();
        if n < 3 {
            return None;
        }
        let m = n + 3;
        let mut a = vec![0.0; m * m];
        let mut b = vec![0.0; m];
        for i in 0..n {
            let (xi, yi) = points[i];
            for j in 0..n {
                let (xj, yj) = points[j];
                let dx = xi - xj;
                let dy = yi - yj;
                a[i * m + j] = tps_kernel(dx * dx + dy * dy);
            }
            for (k, p) in [1.0, xi, yi].into_iter().enumerate() {
                a[i * m + n + k] = p;
                a[(n + k) * m + i] = p;
            }
            b[i] = values[i];
        }

        let solution = solve_dense(&mut a, &mut b, m)?;
        Some(Self {
            centers: points.to_vec(),
            weights: solution[..n].to_vec(),
            affine: [solution[n], solution[n + 1], solution[n + 2]],
        })
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let mut acc = self.affine[0] + self.affine[1] * x + self.affine[2] * y;
        for (&(cx, cy), &w) in self.centers.iter().zip(&self.weights) {
            let dx = x - cx;
            let dy = y - cy;
            acc += w * tps_kernel(dx * dx + dy * dy);
        }
        acc
    }
}

/// Gaussian elimination with partial pivoting on a row-major `m x m` system.
/// Consumes `a` and `b` as scratch; `None` if a pivot vanishes.
fn solve_dense(a: &mut [f64], b: &mut [f64], m: usize) -> Option<Vec<f64>> {
    let scale = a.iter().fold(0.0_f64, |s, v| s.max(v.abs())).max(1.0);
    let tiny = 1e-12 * scale;

    for col in 0..m {
        let pivot = (col..m).max_by(|&r, &s| a[r * m + col].abs().total_cmp(&a[s * m + col].abs()))?;
        if a[pivot * m + col].abs() <= tiny {
            return None;
        }
        if pivot != col {
            for k in 0..m {
                a.swap(col * m + k, pivot * m + k);
            }
            b.swap(col, pivot);
        }
        let diag = a[col * m + col];
        for row in col + 1..m {
            let factor = a[row * m + col] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..m {
                a[row * m + k] -= factor * a[col * m + k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; m];
    for row in (0..m).rev() {
        let mut acc = b[row];
        for k in row + 1..m {
            acc -= a[row * m + k] * x[k];
        }
        x[row] = acc / a[row * m + row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

fn nearest(points: &[(f64, f64)], values: &[f64], x: f64, y: f64) -> f64 {
    points
        .iter()
        .zip(values)
        .map(|(&(px, py), &v)| ((px - x).powi(2) + (py - y).powi(2), v))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map_or(0.0, |(_, v)| v)
}

/// Interpolate `values` at `points` onto `grid`; zero outside the hull.
pub fn interpolate(
    grid: &DenseGrid,
    points: &[(f64, f64)],
    values: &[f64],
    method: InterpolationMethod,
) -> Vec<f64> {
    let hull = ConvexHull::new(points);
    let spline = match method {
        InterpolationMethod::ThinPlate => {
            let fitted = ThinPlateSpline::fit(points, values);
            if fitted.is_none() {
                debug!(samples = points.len(), "thin-plate system singular, using nearest sample");
            }
            fitted
        }
        InterpolationMethod::Nearest => None,
    };

    let mut out = vec![0.0; grid.len()];
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let (x, y) = grid.point(col, row);
            if !hull.contains((x, y)) {
                continue;
            }
            let v = match &spline {
                Some(s) => s.eval(x, y),
                None => nearest(points, values, x, y),
            };
            out[row * grid.width() + col] = if v.is_finite() { v } else { 0.0 };
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lattice(cols: usize, rows: usize, pitch: f64) -> Vec<(f64, f64)> {
        (0..cols)
            .flat_map(|c| (0..rows).map(move |r| (c as f64 * pitch, r as f64 * pitch)))
            .collect()
    }

    #[test]
    fn spline_passes_through_samples() {
        let pts = lattice(4, 3, 2.0);
        let vals: Vec<f64> = pts.iter().map(|(x, y)| (x * 0.7).sin() + y * y * 0.1).collect();
        let tps = ThinPlateSpline::fit(&pts, &vals).unwrap();
        for (p, v) in pts.iter().zip(&vals) {
            assert_abs_diff_eq!(tps.eval(p.0, p.1), *v, epsilon = 1e-8);
        }
    }

    #[test]
    fn spline_reproduces_affine_fields() {
        let pts = lattice(5, 4, 2.0);
        let f = |x: f64, y: f64| 1.5 - 0.25 * x + 2.0 * y;
        let vals: Vec<f64> = pts.iter().map(|&(x, y)| f(x, y)).collect();
        let tps = ThinPlateSpline::fit(&pts, &vals).unwrap();
        for (x, y) in [(1.0, 1.0), (3.3, 5.1), (7.9, 0.2)] {
            assert_abs_diff_eq!(tps.eval(x, y), f(x, y), epsilon = 1e-8);
        }
    }

    #[test]
    fn collinear_samples_are_singular() {
        let pts = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
        assert!(ThinPlateSpline::fit(&pts, &[1.0, 2.0, 3.0, 4.0]).is_none());
    }

    #[test]
    fn outside_hull_is_exactly_zero() {
        // Triangle covering the lower-left half of the square [0, 4]^2.
        let pts = [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)];
        let grid = DenseGrid::new(5, 5, (0.0, 4.0, 0.0, 4.0)).unwrap();
        let out = interpolate(&grid, &pts, &[3.0, 3.0, 3.0], InterpolationMethod::ThinPlate);
        for row in 0..5 {
            for col in 0..5 {
                let v = out[row * 5 + col];
                if col + row > 4 {
                    assert_eq!(v, 0.0);
                } else {
                    assert_abs_diff_eq!(v, 3.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn nearest_fallback_for_degenerate_input() {
        let pts = [(0.0, 0.0), (2.0, 0.0)];
        let grid = DenseGrid::new(3, 1, (0.0, 2.0, 0.0, 0.0)).unwrap();
        let out = interpolate(&grid, &pts, &[1.0, 5.0], InterpolationMethod::ThinPlate);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[2], 5.0);
    }

    #[test]
    fn rejects_empty_resolution() {
        assert!(DenseGrid::new(0, 10, (0.0, 1.0, 0.0, 1.0)).is_err());
    }
}
