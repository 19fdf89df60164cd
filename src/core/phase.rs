//! Phase wrapping and per-channel unwrapping.

use std::f64::consts::{PI, TAU};

/// Normalize to the range [-PI, PI).
#[inline]
pub fn wrap_pm_pi(x: f64) -> f64 {
    (x + PI).rem_euclid(TAU) - PI
}

/// Continuous phase from a wrapped series.
///
/// Each adjacent difference larger than PI in magnitude is replaced by its
/// wrapped equivalent (a jump of exactly +PI keeps its sign), and the
/// corrections accumulate along the series. Afterwards no adjacent
/// difference exceeds PI in magnitude. The first sample is unchanged.
pub fn unwrap(wrapped: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(wrapped.len());
    let Some(&first) = wrapped.first() else {
        return out;
    };
    out.push(first);
    let mut correction = 0.0;
    for w in wrapped.windows(2) {
        let d = w[1] - w[0];
        if d.abs() > PI {
            let mut dw = wrap_pm_pi(d);
            if dw == -PI && d > 0.0 {
                dw = PI;
            }
            correction += dw - d;
        }
        out.push(w[1] + correction);
    }
    out
}

/// Unwrap every channel independently.
pub fn unwrap_channels(wrapped: &[Vec<f64>]) -> Vec<Vec<f64>> {
    wrapped.iter().map(|ch| unwrap(ch)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_pm_pi_in_range() {
        let values = [-10.0 * TAU, -TAU, -PI, -0.1, 0.0, PI, TAU, 3.5 * TAU];
        for v in values {
            let w = wrap_pm_pi(v);
            assert!((-PI..PI).contains(&w), "wrap_pm_pi out of range: {w}");
        }
    }

    #[test]
    fn unwrap_restores_linear_ramp() {
        let truth: Vec<f64> = (0..200).map(|i| 0.37 * i as f64 - 1.0).collect();
        let wrapped: Vec<f64> = truth.iter().map(|&p| wrap_pm_pi(p)).collect();
        let un = unwrap(&wrapped);
        let offset = un[0] - truth[0];
        for (u, t) in un.iter().zip(&truth) {
            assert_abs_diff_eq!(u - offset, *t, epsilon = 1e-9);
        }
    }

    #[test]
    fn unwrap_restores_descending_ramp() {
        let truth: Vec<f64> = (0..200).map(|i| -2.5 * i as f64).collect();
        let wrapped: Vec<f64> = truth.iter().map(|&p| wrap_pm_pi(p)).collect();
        let un = unwrap(&wrapped);
        for (u, t) in un.iter().zip(&truth) {
            assert_abs_diff_eq!(*u, *t, epsilon = 1e-9);
        }
    }

    #[test]
    fn unwrap_is_noop_on_continuous_input() {
        let x = [0.0, 0.5, 1.0, 0.2, -0.8, -3.0];
        assert_eq!(unwrap(&x), x.to_vec());
        assert!(unwrap(&[]).is_empty());
    }
}
