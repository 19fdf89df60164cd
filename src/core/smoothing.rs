//! Box-average smoothing of a dense field.
//!
//! Same-size output, truncated at the field edges. Every input cell is spread
//! evenly over the in-bounds outputs its `size x size` window reaches, so the
//! total (and mean) of the field is preserved for any input. Cells at least
//! `size / 2` away from every edge see the plain `1 / size^2` average.

use crate::core::error::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxFilter {
    size: usize,
}

impl BoxFilter {
    /// `size` must be odd and positive.
    pub fn new(size: usize) -> Result<Self, PipelineError> {
        if size == 0 || size % 2 == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "smoothing kernel must be odd and positive, got {size}"
            )));
        }
        Ok(Self { size })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Smooth a row-major `height x width` field.
    pub fn apply(&self, input: &[f64], width: usize, height: usize) -> Vec<f64> {
        debug_assert_eq!(input.len(), width * height);
        if self.size == 1 {
            return input.to_vec();
        }
        let r = self.size / 2;
        let reach = |i: usize, n: usize| (i.min(r) + (n - 1 - i).min(r) + 1) as f64;
        let col_reach: Vec<f64> = (0..width).map(|c| reach(c, width)).collect();
        let row_reach: Vec<f64> = (0..height).map(|y| reach(y, height)).collect();

        // Horizontal window sums of the reach-weighted input.
        let mut horiz = vec![0.0; input.len()];
        let mut prefix = vec![0.0; width.max(height) + 1];
        for row in 0..height {
            let line = &input[row * width..(row + 1) * width];
            for (i, &v) in line.iter().enumerate() {
                prefix[i + 1] = prefix[i] + v / (col_reach[i] * row_reach[row]);
            }
            for col in 0..width {
                let lo = col.saturating_sub(r);
                let hi = (col + r + 1).min(width);
                horiz[row * width + col] = prefix[hi] - prefix[lo];
            }
        }

        // Vertical window sums of the horizontal sums.
        let mut out = vec![0.0; input.len()];
        for col in 0..width {
            for row in 0..height {
                prefix[row + 1] = prefix[row] + horiz[row * width + col];
            }
            for row in 0..height {
                let lo = row.saturating_sub(r);
                let hi = (row + r + 1).min(height);
                out[row * width + col] = prefix[hi] - prefix[lo];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::util::mean;
    use approx::assert_abs_diff_eq;

    /// Direct scatter: each input cell split over its in-bounds window.
    fn reference(input: &[f64], width: usize, height: usize, size: usize) -> Vec<f64> {
        let r = size as isize / 2;
        let (w, h) = (width as isize, height as isize);
        let window = |row: isize, col: isize| {
            let mut cells = Vec::new();
            for dy in -r..=r {
                for dx in -r..=r {
                    let (y, x) = (row + dy, col + dx);
                    if (0..h).contains(&y) && (0..w).contains(&x) {
                        cells.push((y * w + x) as usize);
                    }
                }
            }
            cells
        };
        let mut out = vec![0.0; input.len()];
        for row in 0..h {
            for col in 0..w {
                let cells = window(row, col);
                let share = input[(row * w + col) as usize] / cells.len() as f64;
                for c in cells {
                    out[c] += share;
                }
            }
        }
        out
    }

    #[test]
    fn matches_direct_convolution() {
        let (w, h) = (17, 13);
        let input: Vec<f64> = (0..w * h).map(|i| ((i * 7919) % 101) as f64 - 50.0).collect();
        let fast = BoxFilter::new(11).unwrap().apply(&input, w, h);
        let slow = reference(&input, w, h, 11);
        for (a, b) in fast.iter().zip(&slow) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn preserves_mean_with_zero_margin() {
        let (w, h) = (40, 30);
        let mut input = vec![0.0; w * h];
        for row in 5..h - 5 {
            for col in 5..w - 5 {
                input[row * w + col] = (row as f64 * 0.3).sin() + col as f64 * 0.01;
            }
        }
        let out = BoxFilter::new(11).unwrap().apply(&input, w, h);
        assert_abs_diff_eq!(mean(&out), mean(&input), epsilon = 1e-12);
    }

    #[test]
    fn preserves_mean_up_to_the_edges() {
        let (w, h) = (23, 14);
        let input: Vec<f64> = (0..w * h).map(|i| 1.0 + ((i * 31) % 17) as f64).collect();
        let out = BoxFilter::new(11).unwrap().apply(&input, w, h);
        assert_abs_diff_eq!(mean(&out), mean(&input), epsilon = 1e-12);
    }

    #[test]
    fn constant_interior_is_unchanged() {
        let (w, h) = (30, 30);
        let out = BoxFilter::new(11).unwrap().apply(&vec![2.0; w * h], w, h);
        assert_abs_diff_eq!(out[15 * w + 15], 2.0, epsilon = 1e-12);
        // Corner collects from a 6x6 window whose cells reach 6..=11 cells per axis.
        let per_axis: f64 = (6..=11).map(|n| 1.0 / n as f64).sum();
        assert_abs_diff_eq!(out[0], 2.0 * per_axis * per_axis, epsilon = 1e-12);
    }

    #[test]
    fn rejects_even_or_zero_kernel() {
        assert!(BoxFilter::new(0).is_err());
        assert!(BoxFilter::new(10).is_err());
        assert_eq!(BoxFilter::new(1).unwrap().apply(&[1.0, 2.0], 2, 1), vec![1.0, 2.0]);
    }
}
