//! Signal Statistics

use serde::Serialize;

/// Summary statistics of a per-frame signal (joint angle, height, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Index of the minimum sample
    pub argmin: usize,
    /// Index of the maximum sample
    pub argmax: usize,
    /// Mean absolute change between consecutive samples
    pub rate_of_change: f64,
    pub samples: usize,
}

impl SignalStats {
    /// Compute statistics over a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let (mut min, mut max) = (f64::MAX, f64::MIN);
        let (mut argmin, mut argmax) = (0, 0);
        let mut m2 = 0.0;
        for (i, &v) in values.iter().enumerate() {
            if v < min {
                min = v;
                argmin = i;
            }
            if v > max {
                max = v;
                argmax = i;
            }
            let d = v - mean;
            m2 += d * d;
        }

        let rate_of_change = if values.len() >= 2 {
            values.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (values.len() - 1) as f64
        } else {
            0.0
        };

        Self {
            mean,
            std_dev: (m2 / n).sqrt(),
            min,
            max,
            argmin,
            argmax,
            rate_of_change,
            samples: values.len(),
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Coefficient of variation (std / |mean|), 0 for a zero mean
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean.abs() < f64::EPSILON {
            0.0
        } else {
            self.std_dev / self.mean.abs()
        }
    }
}
