//! Color lookup tables and per-frame autoscaled color mapping.

use serde::{Deserialize, Serialize};

use crate::core::util::min_max;

/// Entries per lookup table.
pub const LUT_SIZE: usize = 256;

pub type Rgb = [u8; 3];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMap {
    #[default]
    Viridis,
    Inferno,
    Magma,
    Hot,
    Cool,
    Winter,
    Autumn,
    Gray,
}

impl ColorMap {
    pub const ALL: [ColorMap; 8] = [
        ColorMap::Viridis,
        ColorMap::Inferno,
        ColorMap::Magma,
        ColorMap::Hot,
        ColorMap::Cool,
        ColorMap::Winter,
        ColorMap::Autumn,
        ColorMap::Gray,
    ];

    /// Evenly spaced anchor colors, low to high.
    fn anchors(self) -> &'static [[f64; 3]] {
        match self {
            ColorMap::Viridis => &[
                [0.267, 0.005, 0.329],
                [0.283, 0.141, 0.458],
                [0.254, 0.265, 0.530],
                [0.207, 0.372, 0.553],
                [0.164, 0.471, 0.558],
                [0.128, 0.567, 0.551],
                [0.135, 0.659, 0.518],
                [0.267, 0.749, 0.441],
                [0.478, 0.821, 0.318],
                [0.741, 0.873, 0.150],
                [0.993, 0.906, 0.144],
            ],
            ColorMap::Inferno => &[
                [0.001, 0.000, 0.014],
                [0.087, 0.045, 0.225],
                [0.258, 0.039, 0.406],
                [0.416, 0.090, 0.433],
                [0.578, 0.148, 0.404],
                [0.735, 0.216, 0.330],
                [0.865, 0.317, 0.226],
                [0.954, 0.469, 0.099],
                [0.987, 0.645, 0.040],
                [0.964, 0.843, 0.273],
                [0.988, 0.998, 0.645],
            ],
            ColorMap::Magma => &[
                [0.001, 0.000, 0.014],
                [0.078, 0.054, 0.212],
                [0.232, 0.060, 0.438],
                [0.390, 0.100, 0.502],
                [0.550, 0.161, 0.506],
                [0.716, 0.215, 0.475],
                [0.868, 0.288, 0.409],
                [0.967, 0.439, 0.360],
                [0.994, 0.624, 0.427],
                [0.997, 0.812, 0.573],
                [0.987, 0.991, 0.750],
            ],
            ColorMap::Hot => &[
                [0.0417, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 1.0, 1.0],
            ],
            ColorMap::Cool => &[[0.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
            ColorMap::Winter => &[[0.0, 0.0, 1.0], [0.0, 1.0, 0.5]],
            ColorMap::Autumn => &[[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            ColorMap::Gray => &[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
        }
    }

    pub fn lut(self) -> ColorLut {
        ColorLut::from_anchors(self.anchors(), LUT_SIZE)
    }
}

impl std::fmt::Display for ColorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColorMap::Viridis => "viridis",
            ColorMap::Inferno => "inferno",
            ColorMap::Magma => "magma",
            ColorMap::Hot => "hot",
            ColorMap::Cool => "cool",
            ColorMap::Winter => "winter",
            ColorMap::Autumn => "autumn",
            ColorMap::Gray => "gray",
        };
        f.write_str(name)
    }
}

/// Fixed table of RGB entries.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorLut {
    table: Vec<Rgb>,
}

impl ColorLut {
    /// Piecewise-linear resampling of evenly spaced anchors to `len` entries.
    pub fn from_anchors(anchors: &[[f64; 3]], len: usize) -> Self {
        let len = len.max(1);
        let segments = anchors.len().saturating_sub(1);
        let table = (0..len)
            .map(|i| {
                if segments == 0 {
                    return anchors.first().map_or([0, 0, 0], |&c| to_rgb(c));
                }
                let t = if len == 1 { 0.0 } else { i as f64 / (len - 1) as f64 };
                let pos = t * segments as f64;
                let k = (pos.floor() as usize).min(segments - 1);
                let frac = pos - k as f64;
                let (a, b) = (anchors[k], anchors[k + 1]);
                to_rgb([
                    a[0] + (b[0] - a[0]) * frac,
                    a[1] + (b[1] - a[1]) * frac,
                    a[2] + (b[2] - a[2]) * frac,
                ])
            })
            .collect();
        Self { table }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    pub fn entry(&self, i: usize) -> Rgb {
        self.table[i.min(self.table.len() - 1)]
    }

    /// Entry used for constant frames.
    #[inline]
    pub fn midpoint(&self) -> Rgb {
        self.table[self.table.len() / 2]
    }

    /// Color for a value already normalized to `[0, 1]` (clamped; NaN maps to the low end).
    #[inline]
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let i = (t * (self.table.len() - 1) as f64).round() as usize;
        self.entry(i)
    }

    /// Normalize `values` by their own min/max and look each one up.
    /// A constant (or entirely non-finite) frame maps to the midpoint entry.
    pub fn map_autoscaled(&self, values: &[f64]) -> Vec<Rgb> {
        match min_max(values) {
            Some((lo, hi)) if hi > lo => {
                let inv = 1.0 / (hi - lo);
                values.iter().map(|&v| self.sample((v - lo) * inv)).collect()
            }
            _ => vec![self.midpoint(); values.len()],
        }
    }
}

#[inline]
fn to_rgb(c: [f64; 3]) -> Rgb {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}
