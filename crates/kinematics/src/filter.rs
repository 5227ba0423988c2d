//! Median Filter for Landmark Jitter

use crate::KinematicsError;

/// Centered sliding-window median filter.
///
/// Near the ends of the signal the window shrinks to what is available,
/// so the output always has the same length as the input.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    size: usize,
}

impl MedianFilter {
    /// Create a filter with an odd, non-zero window size
    pub fn new(size: usize) -> Result<Self, KinematicsError> {
        if size == 0 || size % 2 == 0 {
            return Err(KinematicsError::InvalidWindow(size));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Smooth a whole signal
    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        if self.size == 1 {
            return values.to_vec();
        }

        let half = self.size / 2;
        let mut window = Vec::with_capacity(self.size);
        (0..values.len())
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(values.len());
                window.clear();
                window.extend_from_slice(&values[lo..hi]);
                window.sort_by(|a, b| a.total_cmp(b));
                window[window.len() / 2]
            })
            .collect()
    }
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self { size: 1 }
    }
}
