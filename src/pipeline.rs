use log::{debug, info};
use serde::Serialize;

use crate::detector::{self, DEFAULT_HEIGHT};
use crate::error::{CpsError, CpsResult};
use crate::filter::{BandpassFilter, FilterSpec, DEFAULT_ORDER};
use crate::framer::{self, DEFAULT_FRAME_DURATION};
use crate::smoother::{self, DEFAULT_WINDOW};
use crate::types::{CpsSeries, Waveform};

pub const DEFAULT_LOW_CUT: f64 = 2000.0;
pub const DEFAULT_HIGH_CUT: f64 = 6000.0;

/// Frames at or above this rate count as active.
pub const ACTIVE_CPS: f64 = 5.0;
/// Frames at or above this rate count as busy.
pub const BUSY_CPS: f64 = 10.0;

/// Tunables of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub low_cut: f64,
    pub high_cut: f64,
    pub order: usize,
    pub height: f64,
    /// `None` means one hundredth of the sample rate.
    pub min_distance: Option<usize>,
    pub frame_duration: f64,
    pub smoothing_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            low_cut: DEFAULT_LOW_CUT,
            high_cut: DEFAULT_HIGH_CUT,
            order: DEFAULT_ORDER,
            height: DEFAULT_HEIGHT,
            min_distance: None,
            frame_duration: DEFAULT_FRAME_DURATION,
            smoothing_window: DEFAULT_WINDOW,
        }
    }
}

impl AnalysisConfig {
    pub fn filter_spec(&self, sample_rate: u32) -> FilterSpec {
        FilterSpec::new(self.low_cut, self.high_cut, sample_rate).with_order(self.order)
    }

    pub fn min_distance_for(&self, sample_rate: u32) -> usize {
        self.min_distance
            .unwrap_or_else(|| detector::default_min_distance(sample_rate))
    }

    /// Checks every stage's settings against `sample_rate` without touching any samples.
    pub fn validate(&self, sample_rate: u32) -> CpsResult<()> {
        self.filter_spec(sample_rate).validate()?;
        if self.min_distance == Some(0) {
            return Err(CpsError::InvalidDetectorSpec("minimum distance must be at least 1 sample".to_string()));
        }
        if self.height.is_nan() || self.height < 0.0 {
            return Err(CpsError::InvalidDetectorSpec(format!("height threshold must be >= 0, got {}", self.height)));
        }
        framer::frame_samples(self.frame_duration, sample_rate)?;
        if self.smoothing_window == 0 {
            return Err(CpsError::InvalidSmoothingWindow);
        }
        Ok(())
    }
}

/// Summary of a smoothed click-rate series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub count_ge_5: usize,
    pub count_ge_10: usize,
}

impl SummaryStats {
    /// `None` for an empty series: the statistics are undefined.
    pub fn from_rates(rates: &[f64]) -> Option<Self> {
        if rates.is_empty() {
            return None;
        }
        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        let max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
        Some(Self {
            mean,
            max,
            min,
            count_ge_5: rates.iter().filter(|&&r| r >= ACTIVE_CPS).count(),
            count_ge_10: rates.iter().filter(|&&r| r >= BUSY_CPS).count(),
        })
    }
}

/// Result of analyzing one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Per-frame rates before smoothing.
    pub raw: CpsSeries,
    pub smoothed: CpsSeries,
    /// Statistics of `smoothed`, `None` when no full frame was available.
    pub stats: Option<SummaryStats>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }
}

/// Band-pass, detect, frame, smooth and summarize one waveform.
///
/// Stateless: concurrent calls on different waveforms share nothing.
pub fn analyze(waveform: &Waveform, config: &AnalysisConfig) -> CpsResult<Analysis> {
    let sample_rate = waveform.sample_rate();
    config.validate(sample_rate)?;

    let filter = BandpassFilter::design(&config.filter_spec(sample_rate))?;
    let filtered = Waveform::new(filter.apply(waveform.samples()), sample_rate);
    debug!("Filtered {} samples", filtered.len());

    let min_distance = config.min_distance_for(sample_rate);
    let raw = framer::compute(&filtered, config.frame_duration, config.height, min_distance)?;

    let smoothed_rates = smoother::smooth(&raw.rates(), config.smoothing_window)?;
    let smoothed = raw.with_rates(&smoothed_rates);
    let stats = SummaryStats::from_rates(&smoothed_rates);

    match &stats {
        Some(s) => info!(
            "Analyzed {:.2} s: {} frames, mean {:.2} CPS, max {:.2} CPS",
            waveform.duration(),
            smoothed.len(),
            s.mean,
            s.max
        ),
        None => info!("Analyzed {:.2} s: shorter than one frame, statistics undefined", waveform.duration()),
    }

    Ok(Analysis { raw, smoothed, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    fn click_train(seconds: usize, clicks_per_second: &[usize]) -> Waveform {
        let frame = RATE as usize;
        let mut x = vec![0.0; seconds * frame];
        for (second, &k) in clicks_per_second.iter().enumerate() {
            let spacing = frame / (k + 1);
            for i in 1..=k {
                x[second * frame + i * spacing] = 0.9;
            }
        }
        Waveform::new(x, RATE)
    }

    #[test]
    fn test_end_to_end_scenario() {
        let wf = click_train(3, &[4, 9, 0]);
        let analysis = analyze(&wf, &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.raw.rates(), vec![4.0, 9.0, 0.0]);
        assert_eq!(analysis.raw.times(), vec![0.5, 1.5, 2.5]);
        assert_eq!(analysis.smoothed.len(), analysis.raw.len());

        // The zero-padded window covers the whole 3-frame series at every position.
        for rate in analysis.smoothed.rates() {
            assert!((rate - 2.6).abs() < 1e-12);
        }

        let raw_stats = SummaryStats::from_rates(&analysis.raw.rates()).unwrap();
        assert_eq!(raw_stats.count_ge_5, 1);
        assert_eq!(raw_stats.count_ge_10, 0);

        let stats = analysis.stats.unwrap();
        assert!((stats.mean - 2.6).abs() < 1e-12);
        assert_eq!(stats.count_ge_5, 0);
    }

    #[test]
    fn test_longer_series_statistics() {
        let wf = click_train(7, &[0, 12, 12, 12, 12, 12, 0]);
        let analysis = analyze(&wf, &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.raw.rates(), vec![0.0, 12.0, 12.0, 12.0, 12.0, 12.0, 0.0]);

        let expected = [4.8, 7.2, 9.6, 12.0, 9.6, 7.2, 4.8];
        let smoothed = analysis.smoothed.rates();
        for (got, want) in smoothed.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{:?}", smoothed);
        }

        let stats = analysis.stats.unwrap();
        assert!((stats.max - 12.0).abs() < 1e-9);
        assert!((stats.min - 4.8).abs() < 1e-9);
        assert!((stats.mean - 55.2 / 7.0).abs() < 1e-9);
        assert_eq!(stats.count_ge_5, 5);
        assert_eq!(stats.count_ge_10, 1);
    }

    #[test]
    fn test_shorter_than_one_frame() {
        let wf = Waveform::new(vec![0.0; 1000], RATE);
        let analysis = analyze(&wf, &AnalysisConfig::default()).unwrap();
        assert!(analysis.is_empty());
        assert!(analysis.stats.is_none());

        let empty = Waveform::new(Vec::new(), RATE);
        let analysis = analyze(&empty, &AnalysisConfig::default()).unwrap();
        assert!(analysis.raw.is_empty());
        assert!(analysis.stats.is_none());
    }

    #[test]
    fn test_invalid_filter_spec_propagates() {
        let wf = click_train(1, &[3]);
        let config = AnalysisConfig { low_cut: 6000.0, high_cut: 2000.0, ..AnalysisConfig::default() };
        assert!(matches!(analyze(&wf, &config), Err(CpsError::InvalidFilterSpec(_))));

        // 6 kHz is above Nyquist at 8 kHz sampling.
        let low_rate = Waveform::new(vec![0.0; 16000], 8000);
        assert!(matches!(
            analyze(&low_rate, &AnalysisConfig::default()),
            Err(CpsError::InvalidFilterSpec(_))
        ));
    }

    #[test]
    fn test_invalid_settings_rejected_even_for_short_input() {
        let wf = Waveform::new(vec![0.0; 10], RATE);
        let config = AnalysisConfig { min_distance: Some(0), ..AnalysisConfig::default() };
        assert!(matches!(analyze(&wf, &config), Err(CpsError::InvalidDetectorSpec(_))));
        let config = AnalysisConfig { smoothing_window: 0, ..AnalysisConfig::default() };
        assert!(matches!(analyze(&wf, &config), Err(CpsError::InvalidSmoothingWindow)));
    }

    #[test]
    fn test_stats_from_rates() {
        assert!(SummaryStats::from_rates(&[]).is_none());
        let stats = SummaryStats::from_rates(&[5.0, 10.0, 4.999, 0.0]).unwrap();
        assert_eq!(stats.count_ge_5, 2);
        assert_eq!(stats.count_ge_10, 1);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.min, 0.0);
    }

    #[test]
    fn test_min_distance_resolution() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_distance_for(44100), 441);
        assert_eq!(config.min_distance_for(48000), 480);
        let config = AnalysisConfig { min_distance: Some(100), ..config };
        assert_eq!(config.min_distance_for(44100), 100);
    }
}
