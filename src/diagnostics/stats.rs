//! Small descriptive statistics shared by the timing analyzers.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

pub(crate) fn median_sorted(sorted_values: &[f64]) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let mid = sorted_values.len() / 2;
    if sorted_values.len() % 2 == 0 {
        (sorted_values[mid - 1] + sorted_values[mid]) / 2.0
    } else {
        sorted_values[mid]
    }
}

pub(crate) fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

/// Tukey upper fence `Q3 + 1.5 * IQR`, with the IQR held at `iqr_floor` or
/// above so near-constant samples do not flag everything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UpperFence {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub fence: f64,
}

impl UpperFence {
    pub(crate) fn from_sorted(sorted_values: &[f64], iqr_floor: f64) -> Self {
        let q1 = percentile_sorted(sorted_values, 0.25);
        let q3 = percentile_sorted(sorted_values, 0.75);
        let iqr = (q3 - q1).max(iqr_floor);
        Self {
            q1,
            q3,
            iqr,
            fence: q3 + 1.5 * iqr,
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_and_percentiles() {
        let values = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(median_sorted(&values), 2.5);
        assert_eq!(percentile_sorted(&values, 0.0), 1.0);
        assert_eq!(percentile_sorted(&values, 1.0), 4.0);
        assert!((percentile_sorted(&values, 0.25) - 1.75).abs() < 1e-9);
        assert_eq!(median_sorted(&[]), 0.0);
    }

    #[test]
    fn fence_respects_iqr_floor() {
        let flat = vec![100.0; 6];
        let fence = UpperFence::from_sorted(&flat, 50.0);
        assert_eq!(fence.iqr, 50.0);
        assert_eq!(fence.fence, 175.0);
    }

    #[test]
    fn spread_statistics() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
        assert_eq!(round_to(3.14159, 2), 3.14);
    }
}
