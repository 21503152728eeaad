use crate::error::{CpsError, CpsResult};

/// Minimum absolute amplitude of a click.
pub const DEFAULT_HEIGHT: f64 = 0.01;

/// Default minimum click separation (~10 ms).
pub fn default_min_distance(sample_rate: u32) -> usize {
    (sample_rate as usize / 100).max(1)
}

/// Indices of click peaks in `samples`, ascending.
///
/// Peaks are local maxima of `|x|` that reach `height`. When two peaks are
/// closer than `min_distance` samples the louder one wins; on equal
/// amplitude the earlier one wins.
pub fn detect(samples: &[f64], height: f64, min_distance: usize) -> CpsResult<Vec<usize>> {
    if min_distance == 0 {
        return Err(CpsError::InvalidDetectorSpec("minimum distance must be at least 1 sample".to_string()));
    }
    if height.is_nan() || height < 0.0 {
        return Err(CpsError::InvalidDetectorSpec(format!("height threshold must be >= 0, got {}", height)));
    }

    let magnitude: Vec<f64> = samples.iter().map(|x| x.abs()).collect();
    let candidates: Vec<usize> = local_maxima(&magnitude)
        .into_iter()
        .filter(|&i| magnitude[i] >= height)
        .collect();

    Ok(select_by_distance(&candidates, &magnitude, min_distance))
}

/// Local maxima with plateau handling. A plateau counts once, at its middle
/// sample (rounded down); the first and last sample are never maxima.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;

    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(peaks: &[usize], magnitude: &[f64], min_distance: usize) -> Vec<usize> {
    if peaks.len() < 2 || min_distance <= 1 {
        return peaks.to_vec();
    }

    // Loudest first, earliest first among equals.
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| magnitude[peaks[b]].total_cmp(&magnitude[peaks[a]]).then(a.cmp(&b)));

    let mut keep = vec![true; peaks.len()];
    for &j in &order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < min_distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < min_distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(&keep)
        .filter_map(|(&p, &kept)| kept.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_simple_peaks() {
        let x = [0.0, 0.5, 0.0, 0.0, -0.8, 0.0, 0.2, 0.0];
        assert_eq!(detect(&x, 0.01, 1).unwrap(), vec![1, 4, 6]);
        assert_eq!(detect(&x, 0.3, 1).unwrap(), vec![1, 4]);
    }

    #[test]
    fn test_edges_are_not_peaks() {
        let x = [1.0, 0.5, 0.2, 0.5, 1.0];
        assert!(detect(&x, 0.01, 1).unwrap().is_empty());
        assert!(detect(&[], 0.01, 1).unwrap().is_empty());
        assert!(detect(&[1.0, 2.0], 0.01, 1).unwrap().is_empty());
    }

    #[test]
    fn test_plateau_reports_midpoint() {
        let x = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0];
        assert_eq!(detect(&x, 0.01, 1).unwrap(), vec![2, 8]);
    }

    #[test]
    fn test_plateau_running_into_end_is_ignored() {
        let x = [0.0, 1.0, 1.0, 1.0];
        assert!(detect(&x, 0.01, 1).unwrap().is_empty());
        let x = [0.0, 1.0, 1.0, 2.0, 0.0];
        assert_eq!(detect(&x, 0.01, 1).unwrap(), vec![3]);
    }

    #[test]
    fn test_height_is_inclusive() {
        let x = [0.0, 0.01, 0.0];
        assert_eq!(detect(&x, 0.01, 1).unwrap(), vec![1]);
    }

    #[test]
    fn test_louder_peak_wins() {
        let mut x = vec![0.0; 50];
        x[10] = 0.5;
        x[15] = 0.9;
        x[20] = 0.4;
        assert_eq!(detect(&x, 0.01, 10).unwrap(), vec![15]);
    }

    #[test]
    fn test_tie_keeps_earlier() {
        let mut x = vec![0.0; 50];
        x[10] = 0.5;
        x[14] = 0.5;
        assert_eq!(detect(&x, 0.01, 10).unwrap(), vec![10]);
    }

    #[test]
    fn test_suppression_is_global() {
        // 20 suppresses 12 and 28; 4 and 36 then survive although each was
        // within reach of a suppressed neighbour.
        let mut x = vec![0.0; 50];
        x[4] = 0.3;
        x[12] = 0.6;
        x[20] = 0.9;
        x[28] = 0.6;
        x[36] = 0.3;
        assert_eq!(detect(&x, 0.01, 10).unwrap(), vec![4, 20, 36]);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(matches!(detect(&[0.0; 4], 0.01, 0), Err(CpsError::InvalidDetectorSpec(_))));
        assert!(matches!(detect(&[0.0; 4], -1.0, 1), Err(CpsError::InvalidDetectorSpec(_))));
        assert!(matches!(detect(&[0.0; 4], f64::NAN, 1), Err(CpsError::InvalidDetectorSpec(_))));
    }

    #[test]
    fn test_min_distance_invariant_on_noise() {
        let mut rng = StdRng::seed_from_u64(7);
        for &distance in &[1usize, 5, 37, 441] {
            let x: Vec<f64> = (0..20_000).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let peaks = detect(&x, 0.3, distance).unwrap();
            assert!(!peaks.is_empty());
            for pair in peaks.windows(2) {
                assert!(pair[1] - pair[0] >= distance, "{:?} closer than {}", pair, distance);
            }
        }
    }

    #[test]
    fn test_default_min_distance() {
        assert_eq!(default_min_distance(44100), 441);
        assert_eq!(default_min_distance(50), 1);
    }
}
