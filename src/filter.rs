use biquad::{Biquad, Coefficients, DirectForm2Transposed};
use log::debug;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::{CpsError, CpsResult};
use crate::types::Waveform;

pub const DEFAULT_ORDER: usize = 10;

/// Band-pass design parameters. Cutoffs in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub order: usize,
    pub low_cut: f64,
    pub high_cut: f64,
    pub sample_rate: u32,
}

impl FilterSpec {
    pub fn new(low_cut: f64, high_cut: f64, sample_rate: u32) -> Self {
        Self { order: DEFAULT_ORDER, low_cut, high_cut, sample_rate }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    pub fn validate(&self) -> CpsResult<()> {
        let nyquist = self.nyquist();
        let invalid = |msg: String| Err(CpsError::InvalidFilterSpec(msg));

        if self.sample_rate == 0 {
            return invalid("sample rate must be positive".to_string());
        }
        if self.order == 0 {
            return invalid("filter order must be at least 1".to_string());
        }
        if !self.low_cut.is_finite() || !self.high_cut.is_finite() {
            return invalid(format!("cutoffs must be finite, got {} and {}", self.low_cut, self.high_cut));
        }
        if self.low_cut <= 0.0 || self.high_cut <= 0.0 {
            return invalid(format!("cutoffs must be positive, got {} and {}", self.low_cut, self.high_cut));
        }
        if self.low_cut >= self.high_cut {
            return invalid(format!("low cutoff {} Hz must be below high cutoff {} Hz", self.low_cut, self.high_cut));
        }
        if self.high_cut >= nyquist {
            return invalid(format!("high cutoff {} Hz must be below Nyquist ({} Hz)", self.high_cut, nyquist));
        }
        Ok(())
    }
}

/// Digital Butterworth band-pass as a cascade of second-order sections.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Coefficients<f64>>,
}

impl BandpassFilter {
    pub fn design(spec: &FilterSpec) -> CpsResult<Self> {
        spec.validate()?;

        let order = spec.order;
        let nyquist = spec.nyquist();

        // Pre-warp against a design rate of 2 (frequencies normalized to Nyquist).
        let fs2 = 4.0;
        let warp = |f: f64| fs2 * (PI * (f / nyquist) / 2.0).tan();
        let w_lo = warp(spec.low_cut);
        let w_hi = warp(spec.high_cut);
        let bw = w_hi - w_lo;
        let wo_sq = w_lo * w_hi;

        let mut poles = Vec::with_capacity(2 * order);
        for p in butterworth_prototype(order) {
            let p_lp = p * (bw / 2.0);
            let disc = (p_lp * p_lp - wo_sq).sqrt();
            poles.push(p_lp + disc);
            poles.push(p_lp - disc);
        }

        let denom: Complex64 = poles.iter().map(|&p| fs2 - p).product();
        let gain = (bw * fs2).powi(order as i32) * (Complex64::new(1.0, 0.0) / denom).re;

        let z_poles: Vec<Complex64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        let mut denominators = pair_conjugates(&z_poles);

        // Poles closest to the unit circle go last.
        denominators.sort_by(|a, b| a.1.total_cmp(&b.1));

        let sections: Vec<Coefficients<f64>> = denominators
            .iter()
            .enumerate()
            .map(|(i, &(a1, a2))| {
                let k = if i == 0 { gain } else { 1.0 };
                Coefficients { a1, a2, b0: k, b1: 0.0, b2: -k }
            })
            .collect();

        debug!(
            "Designed order-{} band-pass {}-{} Hz at {} Hz: {} sections, gain {:e}",
            order,
            spec.low_cut,
            spec.high_cut,
            spec.sample_rate,
            sections.len(),
            gain
        );

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Coefficients<f64>] {
        &self.sections
    }

    /// Edge extension length used by [`BandpassFilter::apply`] for long inputs.
    pub fn pad_len(&self) -> usize {
        let zero_b2 = self.sections.iter().filter(|c| c.b2 == 0.0).count();
        let zero_a2 = self.sections.iter().filter(|c| c.a2 == 0.0).count();
        let taps = 2 * self.sections.len() + 1 - zero_b2.min(zero_a2);
        3 * taps
    }

    /// Zero-phase filtering; the output has the same length as the input.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }
        let edge = self.pad_len().min(samples.len() - 1);
        let mut signal = odd_extension(samples, edge);
        self.forward_backward(&mut signal);
        signal[edge..edge + samples.len()].to_vec()
    }

    fn forward_backward(&self, signal: &mut [f64]) {
        self.run_from_steady_state(signal);
        signal.reverse();
        self.run_from_steady_state(signal);
        signal.reverse();
    }

    /// Runs the cascade with each section's state primed to the step response
    /// level of the first sample.
    fn run_from_steady_state(&self, signal: &mut [f64]) {
        let Some(&x0) = signal.first() else {
            return;
        };
        let mut scale = x0;
        let mut cascade: Vec<DirectForm2Transposed<f64>> = self
            .sections
            .iter()
            .map(|c| {
                let dc = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
                let mut section = DirectForm2Transposed::<f64>::new(*c);
                section.s1 = (dc - c.b0) * scale;
                section.s2 = (c.b2 - c.a2 * dc) * scale;
                scale *= dc;
                section
            })
            .collect();

        for x in signal.iter_mut() {
            *x = cascade.iter_mut().fold(*x, |acc, section| section.run(acc));
        }
    }
}

/// Band-pass a waveform with the default order.
pub fn apply(waveform: &Waveform, low_cut: f64, high_cut: f64) -> CpsResult<Waveform> {
    let spec = FilterSpec::new(low_cut, high_cut, waveform.sample_rate());
    let filter = BandpassFilter::design(&spec)?;
    Ok(Waveform::new(filter.apply(waveform.samples()), waveform.sample_rate()))
}

fn butterworth_prototype(order: usize) -> Vec<Complex64> {
    let n = order as f64;
    (0..order)
        .map(|i| {
            let m = -n + 1.0 + 2.0 * i as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect()
}

/// Groups poles into real second-order denominators `(a1, a2)`.
fn pair_conjugates(poles: &[Complex64]) -> Vec<(f64, f64)> {
    let tol = 1e-12;
    let mut out: Vec<(f64, f64)> = poles
        .iter()
        .filter(|p| p.im > tol)
        .map(|p| (-2.0 * p.re, p.norm_sqr()))
        .collect();

    let mut reals: Vec<f64> = poles.iter().filter(|p| p.im.abs() <= tol).map(|p| p.re).collect();
    reals.sort_by(|a, b| a.total_cmp(b));
    for pair in reals.chunks(2) {
        match *pair {
            [r1, r2] => out.push((-(r1 + r2), r1 * r2)),
            [r] => out.push((-r, 0.0)),
            _ => {}
        }
    }
    out
}

/// Point-symmetric extension of `edge` samples around both ends.
fn odd_extension(samples: &[f64], edge: usize) -> Vec<f64> {
    let len = samples.len();
    let first = samples[0];
    let last = samples[len - 1];

    let mut ext = Vec::with_capacity(len + 2 * edge);
    ext.extend((1..=edge).rev().map(|i| 2.0 * first - samples[i]));
    ext.extend_from_slice(samples);
    ext.extend((1..=edge).map(|i| 2.0 * last - samples[len - 1 - i]));
    ext
}
