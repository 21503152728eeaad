use std::str::FromStr;

/// Parses a frequency such as `2000`, `2000hz`, `2k` or `2.5kHz` into Hz.
pub fn frequency_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Frequency cannot be empty".to_string());
    }

    let lower = s.to_ascii_lowercase();
    let lower = lower.strip_suffix("hz").unwrap_or(&lower).trim_end();
    let (number, scale) = match lower.strip_suffix('k') {
        Some(rest) => (rest.trim_end(), 1000.0),
        None => (lower, 1.0),
    };

    let value = f64::from_str(number).map_err(|e| format!("Invalid frequency '{}': {}", s, e))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("Frequency must be positive, got {}", s));
    }
    Ok(value * scale)
}

/// Parses a strictly positive duration in seconds; an `s` or `ms` suffix is accepted.
pub fn seconds_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let (number, per_second) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1000.0)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1.0)
    } else {
        (s, 1.0)
    };
    f64::from_str(number.trim())
        .map_err(|e| format!("Invalid duration '{}': {}", s, e))
        .and_then(|v| {
            if v.is_finite() && v > 0.0 {
                Ok(v / per_second)
            } else {
                Err(format!("Duration must be positive, got {}", s))
            }
        })
}

/// Parses a non-negative amplitude threshold.
pub fn amplitude_parser(s: &str) -> Result<f64, String> {
    let s = s.trim();
    f64::from_str(s)
        .map_err(|e| format!("Invalid amplitude '{}': {}", s, e))
        .and_then(|v| {
            if v.is_finite() && v >= 0.0 {
                Ok(v)
            } else {
                Err(format!("Amplitude must be >= 0, got {}", s))
            }
        })
}
