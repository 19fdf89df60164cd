//! Butterworth band-pass design and zero-phase filtering.
//!
//! The band-pass comes from an `ORDER`-th analog Butterworth low-pass
//! prototype, transformed low-pass to band-pass around the prewarped edges and
//! mapped to the z-plane with the bilinear transform. That doubles the order,
//! so a 4th-order design yields four second-order sections with unity gain at
//! the geometric band center and -3 dB at both edges. `filtfilt` runs the
//! cascade forward and backward over an odd-reflected, primed signal so that
//! the net phase response is zero.

use rustfft::num_complex::Complex64;

use crate::core::error::PipelineError;

/// Order of the analog low-pass prototype.
pub const ORDER: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    // Transposed direct form II (a0 = 1)
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
    // state
    z1: f64,
    z2: f64,
}

impl Biquad {
    #[inline]
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Section with a double zero pair at DC and Nyquist (`1 - z^-2`) and the
    /// complex pole pair `pole`, `conj(pole)`.
    pub fn bandpass_from_pole(pole: Complex64) -> Self {
        Self::new(1.0, 0.0, -1.0, -2.0 * pole.re, pole.norm_sqr())
    }

    /// Scale the numerator so that `|H(e^{jw})| = 1`.
    pub fn normalize_at(&mut self, w: f64) {
        let mag = self.response(w).norm();
        if mag > f64::EPSILON {
            self.b0 /= mag;
            self.b1 /= mag;
            self.b2 /= mag;
        }
    }

    /// Load the state this section would hold after a long run of constant
    /// input `u`. Returns the matching steady-state output.
    pub fn prime(&mut self, u: f64) -> f64 {
        let den = 1.0 + self.a1 + self.a2;
        let y = if den.abs() > f64::EPSILON {
            u * (self.b0 + self.b1 + self.b2) / den
        } else {
            0.0
        };
        self.z1 = y - self.b0 * u;
        self.z2 = self.b2 * u - self.a2 * y;
        y
    }

    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn process_in_place(&mut self, buf: &mut [f64]) {
        for v in buf.iter_mut() {
            *v = self.process_sample(*v);
        }
    }

    /// Complex response at normalized angular frequency `w` (rad/sample).
    pub fn response(&self, w: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;
        (self.b0 + self.b1 * z1 + self.b2 * z2) / (1.0 + self.a1 * z1 + self.a2 * z2)
    }
}

/// Left-half-plane poles of an `order`-th analog Butterworth low-pass with
/// unit cutoff.
pub fn prototype_poles(order: usize) -> Vec<Complex64> {
    (0..order)
        .map(|k| {
            let theta = std::f64::consts::PI * (2 * k + 1) as f64 / (2 * order) as f64
                + std::f64::consts::FRAC_PI_2;
            Complex64::from_polar(1.0, theta)
        })
        .collect()
}

/// Cascade of second-order sections forming one band-pass filter.
#[derive(Clone, Debug)]
pub struct BandPass {
    pub low_hz: f64,
    pub high_hz: f64,
    pub fs: f64,
    sections: Vec<Biquad>,
}

impl BandPass {
    /// Design a 4th-order Butterworth band-pass. Cutoffs must satisfy
    /// `0 < low_hz < high_hz < fs / 2`.
    pub fn design(low_hz: f64, high_hz: f64, fs: f64) -> Result<Self, PipelineError> {
        if !fs.is_finite() || fs <= 0.0 {
            return Err(PipelineError::InvalidSampleRate(fs));
        }
        let nyquist_hz = 0.5 * fs;
        let ok = low_hz.is_finite()
            && high_hz.is_finite()
            && low_hz > 0.0
            && low_hz < high_hz
            && high_hz < nyquist_hz;
        if !ok {
            return Err(PipelineError::InvalidBand {
                low_hz,
                high_hz,
                nyquist_hz,
            });
        }
        // Prewarped analog edges (rad/s).
        let fs2 = 2.0 * fs;
        let w_lo = fs2 * (std::f64::consts::PI * low_hz / fs).tan();
        let w_hi = fs2 * (std::f64::consts::PI * high_hz / fs).tan();
        let bw = w_hi - w_lo;
        let w0_sq = w_lo * w_hi;
        let w_center = 2.0 * (w0_sq.sqrt() / fs2).atan();

        let mut sections = Vec::with_capacity(ORDER);
        for p in prototype_poles(ORDER) {
            let half = p * (0.5 * bw);
            let root = (half * half - w0_sq).sqrt();
            for s in [half + root, half - root] {
                let z = (fs2 + s) / (fs2 - s);
                if z.im > 0.0 {
                    let mut section = Biquad::bandpass_from_pole(z);
                    section.normalize_at(w_center);
                    sections.push(section);
                }
            }
        }
        debug_assert_eq!(sections.len(), ORDER);
        Ok(Self {
            low_hz,
            high_hz,
            fs,
            sections,
        })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Total order of the cascade.
    pub fn order(&self) -> usize {
        2 * self.sections.len()
    }

    /// Magnitude response at `hz`.
    pub fn magnitude(&self, hz: f64) -> f64 {
        let w = 2.0 * std::f64::consts::PI * hz / self.fs;
        self.sections
            .iter()
            .map(|s| s.response(w))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// One causal pass starting from the steady state of `buf[0]`.
    fn run(&self, buf: &mut [f64]) {
        let Some(&first) = buf.first() else {
            return;
        };
        let mut sections = self.sections.clone();
        let mut u = first;
        for s in sections.iter_mut() {
            u = s.prime(u);
        }
        for s in sections.iter_mut() {
            s.process_in_place(buf);
        }
    }

    /// Zero-phase forward-backward filtering.
    pub fn filtfilt(&self, input: &[f64]) -> Vec<f64> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = (3 * self.order()).min(n - 1);

        let mut ext = Vec::with_capacity(n + 2 * pad);
        let (first, last) = (input[0], input[n - 1]);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
        ext.extend_from_slice(input);
        ext.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i]));

        self.run(&mut ext);
        ext.reverse();
        self.run(&mut ext);
        ext.reverse();

        ext[pad..pad + n].to_vec()
    }
}
