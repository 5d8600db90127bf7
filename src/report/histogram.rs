//! Equal-width histogram of historical resale prices.

use serde::Serialize;

/// Number of bins used for the price distribution.
pub const DEFAULT_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin finite `values` into `bins` equal-width bins over `[min, max]`.
    ///
    /// Every bin is half-open except the last, which also includes `max`. A
    /// degenerate range (all values equal) is widened by 0.5 on each side.
    /// Returns `None` when there are no finite values or `bins == 0`.
    pub fn from_values(values: impl IntoIterator<Item = f64>, bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        if max <= min {
            min -= 0.5;
            max += 0.5;
        }

        let mut hist = Self {
            min,
            max,
            counts: vec![0; bins],
        };
        for v in values {
            if let Some(i) = hist.bin_of(v) {
                hist.counts[i] += 1;
            }
        }
        Some(hist)
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    /// `bins + 1` bin edges from `min` to `max`.
    pub fn edges(&self) -> Vec<f64> {
        let w = self.bin_width();
        let n = self.counts.len();
        (0..=n)
            .map(|i| if i == n { self.max } else { self.min + w * i as f64 })
            .collect()
    }

    /// Bin containing `value`, or `None` if it lies outside `[min, max]`.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.min || value > self.max {
            return None;
        }
        let n = self.counts.len();
        let i = ((value - self.min) / self.bin_width()).floor() as usize;
        Some(i.min(n - 1))
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// X-range covering the histogram and `marker` (if finite).
    pub fn x_bounds_with(&self, marker: f64) -> [f64; 2] {
        if marker.is_finite() {
            [self.min.min(marker), self.max.max(marker)]
        } else {
            [self.min, self.max]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_edges() {
        let h = Histogram::from_values([0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5).unwrap();
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 10.0);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(h.edges(), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(h.counts.iter().sum::<usize>(), 6);
    }

    #[test]
    fn max_lands_in_last_bin() {
        let h = Histogram::from_values([0.0, 10.0], 20).unwrap();
        assert_eq!(h.bin_of(10.0), Some(19));
        assert_eq!(h.counts[19], 1);
    }

    #[test]
    fn marker_outside_range_has_no_bin() {
        let h = Histogram::from_values([100.0, 200.0], 4).unwrap();
        assert_eq!(h.bin_of(250.0), None);
        assert_eq!(h.bin_of(150.0), Some(2));
        assert_eq!(h.x_bounds_with(250.0), [100.0, 250.0]);
        assert_eq!(h.x_bounds_with(f64::NAN), [100.0, 200.0]);
    }

    #[test]
    fn degenerate_range_is_widened() {
        let h = Histogram::from_values([5.0, 5.0, 5.0], 2).unwrap();
        assert_eq!((h.min, h.max), (4.5, 5.5));
        assert_eq!(h.counts, vec![0, 3]);
    }

    #[test]
    fn empty_input_is_none() {
        assert!(Histogram::from_values(Vec::<f64>::new(), DEFAULT_BINS).is_none());
        assert!(Histogram::from_values([f64::NAN], DEFAULT_BINS).is_none());
        assert!(Histogram::from_values([1.0], 0).is_none());
    }
}
