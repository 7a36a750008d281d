// Numeric primitives shared by the daily and seasonal computations.

/// Replacement level as a fraction of the daily median.
pub const REPLACEMENT_MULTIPLIER: f64 = 0.9;

/// Win value as a fraction of the daily median.
pub const WIN_MULTIPLIER: f64 = 0.92;

/// Denominators smaller than this are treated as zero.
const ZERO_EPSILON: f64 = 1e-12;

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Statistical median: the middle element for odd counts, the mean of the
/// two middle elements for even counts. Returns 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < ZERO_EPSILON {
        return 0.0;
    }
    numerator / denominator
}

/// Fractional distance of `value` above `baseline` (negative when below).
pub fn pct_above(value: f64, baseline: f64) -> f64 {
    ratio(value - baseline, baseline)
}

/// Geometric mean of strictly positive values. Returns 0.0 for an empty
/// slice or when any value is not positive.
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| *v <= 0.0) {
        return 0.0;
    }
    let log_mean = values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64;
    log_mean.exp()
}

pub fn replacement_level(median: f64) -> f64 {
    REPLACEMENT_MULTIPLIER * median
}

pub fn win_value(median: f64) -> f64 {
    WIN_MULTIPLIER * median
}
