use log::debug;

use crate::detector;
use crate::error::{CpsError, CpsResult};
use crate::types::{CpsPoint, CpsSeries, Waveform};

pub const DEFAULT_FRAME_DURATION: f64 = 1.0;

/// Samples per frame, `floor(duration * rate)`.
pub fn frame_samples(frame_duration: f64, sample_rate: u32) -> CpsResult<usize> {
    if !frame_duration.is_finite() || frame_duration <= 0.0 {
        return Err(CpsError::InvalidFrameSpec(format!("frame duration must be positive, got {}", frame_duration)));
    }
    let samples = (frame_duration * sample_rate as f64).floor() as usize;
    if samples == 0 {
        return Err(CpsError::InvalidFrameSpec(format!(
            "frame of {} s is shorter than one sample at {} Hz",
            frame_duration, sample_rate
        )));
    }
    Ok(samples)
}

/// Clicks per second for every full frame of `waveform`.
///
/// Frames tile the signal from the start without overlap; a trailing partial
/// frame is dropped. Each point is stamped with the frame midpoint.
pub fn compute(waveform: &Waveform, frame_duration: f64, height: f64, min_distance: usize) -> CpsResult<CpsSeries> {
    let sample_rate = waveform.sample_rate();
    let hop = frame_samples(frame_duration, sample_rate)?;
    let samples = waveform.samples();
    let num_frames = samples.len() / hop;

    let mut points = Vec::with_capacity(num_frames);
    for (i, frame) in samples.chunks_exact(hop).enumerate() {
        let start = i * hop;
        let end = start + hop;
        let clicks = detector::detect(frame, height, min_distance)?.len();
        points.push(CpsPoint {
            time: (start + end) as f64 / (2.0 * sample_rate as f64),
            rate: clicks as f64 / frame_duration,
        });
    }

    debug!(
        "Framed {} samples into {} frames of {} samples ({} dropped)",
        samples.len(),
        num_frames,
        hop,
        samples.len() - num_frames * hop
    );

    Ok(CpsSeries::new(points))
}
