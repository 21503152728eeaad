use serde::Serialize;

/// Mono sample sequence at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// One frame of the click-rate series: frame midpoint in seconds and clicks per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpsPoint {
    pub time: f64,
    pub rate: f64,
}

/// Click rate per frame in increasing time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CpsSeries {
    points: Vec<CpsPoint>,
}

impl CpsSeries {
    pub fn new(points: Vec<CpsPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CpsPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.rate).collect()
    }

    /// Same time axis with the rates replaced, e.g. after smoothing.
    pub fn with_rates(&self, rates: &[f64]) -> Self {
        let points = self
            .points
            .iter()
            .zip(rates)
            .map(|(p, &rate)| CpsPoint { time: p.time, rate })
            .collect();
        Self { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_duration() {
        let wf = Waveform::new(vec![0.0; 22050], 44100);
        assert_eq!(wf.len(), 22050);
        assert!((wf.duration() - 0.5).abs() < 1e-12);
        assert_eq!(Waveform::new(vec![], 44100).duration(), 0.0);
    }

    #[test]
    fn test_series_with_rates_keeps_times() {
        let series = CpsSeries::new(vec![
            CpsPoint { time: 0.5, rate: 4.0 },
            CpsPoint { time: 1.5, rate: 9.0 },
        ]);
        let replaced = series.with_rates(&[1.0, 2.0]);
        assert_eq!(replaced.times(), vec![0.5, 1.5]);
        assert_eq!(replaced.rates(), vec![1.0, 2.0]);
    }
}
