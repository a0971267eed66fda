//! Running sum/count aggregation.

use crate::{CourierError, Result};

/// Accumulates integers and reports their arithmetic mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct Average {
    sum: i64,
    count: u64,
}

impl Average {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value. The sum wraps at `i64` width.
    pub fn push(&mut self, value: i64) {
        self.sum = self.sum.wrapping_add(value);
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// Floating-point mean of everything pushed.
    pub fn finish(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(CourierError::InvalidArgument(
                "cannot average an empty sequence".to_string(),
            ));
        }
        Ok(self.sum as f64 / self.count as f64)
    }
}

impl Extend<i64> for Average {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}
