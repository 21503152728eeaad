use crate::error::{CpsError, CpsResult};

pub const DEFAULT_WINDOW: usize = 5;

/// Centered moving average with output the same length as the input.
///
/// Positions outside the input count as zero and the sum is always divided
/// by the full window, so the first and last `window / 2` values are biased
/// towards zero.
pub fn smooth(rates: &[f64], window: usize) -> CpsResult<Vec<f64>> {
    if window == 0 {
        return Err(CpsError::InvalidSmoothingWindow);
    }
    let weight = 1.0 / window as f64;
    let lead = (window - 1) / 2;
    let len = rates.len() as isize;

    let smoothed = (0..rates.len())
        .map(|i| {
            let hi = (i + lead) as isize;
            let lo = hi - (window as isize - 1);
            let lo = lo.max(0) as usize;
            let hi = hi.min(len - 1) as usize;
            rates[lo..=hi].iter().sum::<f64>() * weight
        })
        .collect();
    Ok(smoothed)
}
