use rand::{Rng, SeedableRng};

/// Generate sine wave samples with an initial phase offset (radians).
pub fn sine(fs: f64, f: f64, n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * f * (i as f64) / fs + phase).sin())
        .collect()
}

/// Uniform white noise in [-1, 1), reproducible from `seed`.
pub fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// `num` evenly spaced values from `start` to `stop` (inclusive).
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| if i + 1 == num { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// `(min, max)` ignoring NaN; `None` when no finite value exists.
pub fn min_max(x: &[f64]) -> Option<(f64, f64)> {
    x.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let v = linspace(0.0, 14.0, 700);
        assert_eq!(v.len(), 700);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[699], 14.0);
        assert_eq!(linspace(3.0, 5.0, 1), vec![3.0]);
    }

    #[test]
    fn min_max_skips_nan() {
        assert_eq!(min_max(&[f64::NAN, 2.0, -1.0]), Some((-1.0, 2.0)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn noise_is_seeded() {
        assert_eq!(white_noise(16, 7), white_noise(16, 7));
        assert!(white_noise(64, 1).iter().all(|v| (-1.0..1.0).contains(v)));
    }
}
