use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex64, num_traits::Zero};

/// FFT-based analytic signal for series of one fixed length.
/// Plans are built once and reused for every channel.
pub struct Hilbert {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
    /// Spectral weights: 1 at DC (and Nyquist for even n), 2 for positive, 0 for negative bins.
    weights: Vec<f64>,
}

impl Hilbert {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);

        let mut weights = vec![0.0; n];
        if n > 0 {
            weights[0] = 1.0;
            let half = n / 2;
            if n % 2 == 0 {
                weights[1..half].fill(2.0);
                weights[half] = 1.0;
            } else {
                weights[1..=half].fill(2.0);
            }
        }

        Self {
            n,
            fft,
            ifft,
            weights,
        }
    }

    /// Complex analytic signal: real part equals `input`, angle is the
    /// instantaneous phase. No zero padding, so the transform length is exactly `n`.
    pub fn analytic(&self, input: &[f64]) -> Vec<Complex64> {
        assert_eq!(input.len(), self.n);
        if self.n == 0 {
            return Vec::new();
        }

        // --- forward FFT ---
        let mut x: Vec<Complex64> = input.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.fft.process(&mut x);

        // --- construct analytic spectrum ---
        for (xi, &w) in x.iter_mut().zip(&self.weights) {
            if w == 0.0 {
                *xi = Complex64::zero();
            } else {
                *xi *= w;
            }
        }

        // --- inverse FFT ---
        self.ifft.process(&mut x);

        // normalize (rustfft does not scale ifft)
        let scale = 1.0 / self.n as f64;
        for xi in x.iter_mut() {
            *xi *= scale;
        }
        x
    }
}

/// One-shot analytic signal.
pub fn analytic_signal(input: &[f64]) -> Vec<Complex64> {
    if input.is_empty() {
        return Vec::new();
    }
    Hilbert::new(input.len()).analytic(input)
}
