//! Plane-wave phase-gradient velocity estimate.
//!
//! Under a local plane wave `phi(x, t) ~ k.x - w t` the apparent velocity is
//! `v = -(dphi/dt) * grad(phi) / |grad(phi)|^2`. The squared gradient is
//! regularised with `epsilon`, so channels without spatial phase structure get
//! a finite (small) velocity instead of a division by zero. This is a
//! heuristic display quantity, not a physical wave speed.

use tracing::debug;

use crate::core::grid::ElectrodeGrid;
use crate::core::sampler::SampledState;

/// Numerical gradient of a row-major `rows x columns` field with sample
/// spacing `h`: central differences inside, one-sided at the borders, zero
/// along a dimension of length 1. Returns `(d/dx, d/dy)`, x along columns.
pub fn gradient(field: &[f64], columns: usize, rows: usize, h: f64) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(field.len(), columns * rows);
    let at = |c: usize, r: usize| field[r * columns + c];
    let mut gx = vec![0.0; field.len()];
    let mut gy = vec![0.0; field.len()];

    for r in 0..rows {
        for c in 0..columns {
            let i = r * columns + c;
            gx[i] = diff_1d(columns, c, h, |k| at(k, r));
            gy[i] = diff_1d(rows, r, h, |k| at(c, k));
        }
    }
    (gx, gy)
}

#[inline]
fn diff_1d(len: usize, k: usize, h: f64, f: impl Fn(usize) -> f64) -> f64 {
    if len < 2 {
        0.0
    } else if k == 0 {
        (f(1) - f(0)) / h
    } else if k == len - 1 {
        (f(k) - f(k - 1)) / h
    } else {
        (f(k + 1) - f(k - 1)) / (2.0 * h)
    }
}

/// Per-channel velocity and advected sample positions.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityField {
    pub grad_x: Vec<f64>,
    pub grad_y: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    /// Rest position + velocity * dt.
    pub positions: Vec<(f64, f64)>,
}

impl VelocityField {
    pub fn speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.vx.iter().zip(&self.vy).map(|(x, y)| x.hypot(*y))
    }

    pub fn max_speed(&self) -> f64 {
        self.speeds().fold(0.0, f64::max)
    }

    pub fn mean_speed(&self) -> f64 {
        let n = self.vx.len();
        if n == 0 {
            return 0.0;
        }
        self.speeds().sum::<f64>() / n as f64
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VelocityFieldEstimator {
    /// Added to `|grad|^2` before dividing.
    pub epsilon: f64,
    /// Advection step in seconds.
    pub dt: f64,
}

impl VelocityFieldEstimator {
    pub fn new(epsilon: f64, dt: f64) -> Self {
        Self { epsilon, dt }
    }

    #[inline]
    fn raw_velocity(&self, phase_rate: f64, gx: f64, gy: f64) -> (f64, f64) {
        let denom = gx * gx + gy * gy + self.epsilon;
        (-phase_rate * gx / denom, -phase_rate * gy / denom)
    }

    /// Velocity from phase rate and spatial gradient. Non-finite results
    /// (zero `epsilon` with a flat gradient, non-finite inputs) become zero.
    #[inline]
    pub fn velocity(&self, phase_rate: f64, gx: f64, gy: f64) -> (f64, f64) {
        let (vx, vy) = self.raw_velocity(phase_rate, gx, gy);
        if vx.is_finite() && vy.is_finite() {
            (vx, vy)
        } else {
            (0.0, 0.0)
        }
    }

    pub fn estimate(&self, grid: &ElectrodeGrid, state: &SampledState) -> VelocityField {
        let lattice = grid.to_lattice(&state.phase);
        let (gx_lat, gy_lat) = gradient(&lattice, grid.columns(), grid.rows(), grid.pitch());
        let grad_x = grid.from_lattice(&gx_lat);
        let grad_y = grid.from_lattice(&gy_lat);

        let n = grid.channel_count();
        let mut vx = Vec::with_capacity(n);
        let mut vy = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(n);
        let mut degenerate = 0usize;
        for (ch, (px, py)) in grid.rest_positions().into_iter().enumerate() {
            let (gx, gy) = (grad_x[ch], grad_y[ch]);
            let (rx, ry) = self.raw_velocity(state.phase_rate[ch], gx, gy);
            if !(rx.is_finite() && ry.is_finite()) {
                degenerate += 1;
            }
            let (x, y) = self.velocity(state.phase_rate[ch], gx, gy);
            vx.push(x);
            vy.push(y);
            positions.push((px + x * self.dt, py + y * self.dt));
        }
        if degenerate > 0 {
            debug!(degenerate, "non-finite velocity replaced by zero");
        }

        VelocityField {
            grad_x,
            grad_y,
            vx,
            vy,
            positions,
        }
    }
}
