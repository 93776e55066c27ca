//! Scalar reduction kernels over one step's per-run values
//!
//! All kernels propagate NaN: a NaN anywhere in the input yields NaN.
//! Empty input yields the identity for `sum`/`prod` and NaN otherwise.

/// Sum using Kahan (compensated) summation for numerical stability.
///
/// Runs of the same experiment often differ only in late decimal places,
/// so naive summation would leak rounding noise into the reduced curve.
#[must_use]
pub fn sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;

    for &value in data {
        // Early exit for infinity/NaN to avoid compensation artifacts
        if !value.is_finite() {
            return data.iter().sum();
        }

        let y = value - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Arithmetic mean.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    sum(data) / data.len() as f64
}

/// Population variance (ddof = 0), two-pass.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn var(data: &[f64]) -> f64 {
    let mu = mean(data);
    if !mu.is_finite() {
        return f64::NAN;
    }
    let squared: Vec<f64> = data.iter().map(|&x| (x - mu) * (x - mu)).collect();
    sum(&squared) / data.len() as f64
}

/// Population standard deviation (ddof = 0).
#[must_use]
pub fn std(data: &[f64]) -> f64 {
    var(data).sqrt()
}

/// Minimum.
#[must_use]
pub fn min(data: &[f64]) -> f64 {
    fold_nan_aware(data, f64::min)
}

/// Maximum.
#[must_use]
pub fn max(data: &[f64]) -> f64 {
    fold_nan_aware(data, f64::max)
}

/// Median; the mean of the two middle values for even lengths.
#[must_use]
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() || data.iter().any(|x| x.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Product.
#[must_use]
pub fn prod(data: &[f64]) -> f64 {
    data.iter().product()
}

fn fold_nan_aware(data: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    let Some((&first, rest)) = data.split_first() else {
        return f64::NAN;
    };
    if first.is_nan() {
        return f64::NAN;
    }
    rest.iter()
        .try_fold(first, |acc, &x| (!x.is_nan()).then(|| pick(acc, x)))
        .unwrap_or(f64::NAN)
}
