//! Zero-phase Butterworth low-pass filter.
//!
//! The 4th-order response is built as a cascade of two second-order sections
//! whose coefficients come from the Audio EQ Cookbook (bilinear transform with
//! frequency pre-warping), which places the poles exactly on the Butterworth
//! circle. [`ButterworthLowpass::filtfilt`] runs the cascade forward and then
//! backward over an odd-extended copy of the signal so the result has no
//! phase shift.

use std::f64::consts::PI;

use crate::error::{AudioError, AudioResult};

/// Filter order used for distance muffling.
pub const LOWPASS_ORDER: usize = 4;

/// Upper bound on the normalized cutoff (fraction of Nyquist).
pub const MAX_NORMALIZED_CUTOFF: f64 = 0.99;

/// Samples of odd extension added to each end before zero-phase filtering.
const EDGE_PADDING: usize = 3 * (LOWPASS_ORDER + 1);

/// One second-order section, Direct Form II Transposed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Low-pass section at `w0` radians/sample with quality `q`.
    fn lowpass(w0: f64, q: f64) -> Self {
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos_w0) / a0;
        Self {
            b0: b1 / 2.0,
            b1,
            b2: b1 / 2.0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn is_finite(&self) -> bool {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite())
    }

    /// Stability triangle: both poles strictly inside the unit circle.
    fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Filter `data` in place, starting from the steady state for `data[0]`.
    fn run(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else {
            return;
        };

        // Steady state for a constant input (unity DC gain)
        let mut z2 = (self.b2 - self.a2) * first;
        let mut z1 = (self.b1 - self.a1) * first + z2;

        for sample in data.iter_mut() {
            let x = *sample;
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            *sample = y;
        }
    }
}

/// A 4th-order Butterworth low-pass filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterworthLowpass {
    sections: [Biquad; LOWPASS_ORDER / 2],
    normalized_cutoff: f64,
}

impl ButterworthLowpass {
    /// Design the filter.
    ///
    /// `normalized_cutoff` is a fraction of the Nyquist frequency and is
    /// clamped to [`MAX_NORMALIZED_CUTOFF`].
    pub fn design(normalized_cutoff: f64) -> AudioResult<Self> {
        if !(normalized_cutoff.is_finite() && normalized_cutoff > 0.0) {
            return Err(AudioError::unstable(
                "lowpass design",
                format!("cutoff {normalized_cutoff} is not a positive finite fraction of Nyquist"),
            ));
        }

        let wn = normalized_cutoff.min(MAX_NORMALIZED_CUTOFF);
        let w0 = PI * wn;

        let mut sections = [Biquad::lowpass(w0, 1.0); LOWPASS_ORDER / 2];
        for (k, section) in sections.iter_mut().enumerate() {
            // Pole pair angles of the analog prototype
            let theta = PI * (2 * k + 1) as f64 / (2 * LOWPASS_ORDER) as f64;
            let q = 1.0 / (2.0 * theta.cos());
            *section = Biquad::lowpass(w0, q);

            if !section.is_finite() || !section.is_stable() {
                return Err(AudioError::unstable(
                    "lowpass design",
                    format!("section {k} unstable at normalized cutoff {wn}"),
                ));
            }
        }

        Ok(Self {
            sections,
            normalized_cutoff: wn,
        })
    }

    /// Design from a cutoff in Hz.
    pub fn with_cutoff_hz(cutoff_hz: f64, sample_rate: u32) -> AudioResult<Self> {
        let nyquist = f64::from(sample_rate) / 2.0;
        Self::design(cutoff_hz / nyquist)
    }

    /// Effective cutoff as a fraction of Nyquist.
    #[must_use]
    pub const fn normalized_cutoff(&self) -> f64 {
        self.normalized_cutoff
    }

    /// Single forward pass through the cascade.
    fn forward(&self, data: &mut [f64]) {
        for section in &self.sections {
            section.run(data);
        }
    }

    /// Zero-phase (forward-backward) filtering.
    pub fn filtfilt(&self, input: &[f64]) -> AudioResult<Vec<f64>> {
        let n = input.len();
        if n < 2 {
            return Ok(input.to_vec());
        }

        let edge = EDGE_PADDING.min(n - 1);
        let first = input[0];
        let last = input[n - 1];

        let mut ext = Vec::with_capacity(n + 2 * edge);
        ext.extend((1..=edge).rev().map(|i| 2.0 * first - input[i]));
        ext.extend_from_slice(input);
        ext.extend((1..=edge).map(|i| 2.0 * last - input[n - 1 - i]));

        self.forward(&mut ext);
        ext.reverse();
        self.forward(&mut ext);
        ext.reverse();

        let output = ext[edge..edge + n].to_vec();
        if output.iter().any(|s| !s.is_finite()) {
            return Err(AudioError::unstable("lowpass filtering", "non-finite output"));
        }
        Ok(output)
    }
}
