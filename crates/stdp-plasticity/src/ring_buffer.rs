// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike-count ring buffer indexed by absolute delivery step

use crate::error::ConfigurationError;

/// Fixed-size accumulator of spike counts
///
/// Slot `step mod len` holds the count for `step`. Reading a slot clears it, so
/// a buffer of `min_delay + max_delay` slots never aliases two live steps.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer {
    values: Vec<f64>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self, ConfigurationError> {
        if capacity == 0 {
            return Err(ConfigurationError::EmptyRingBuffer);
        }
        Ok(Self {
            values: vec![0.0; capacity],
        })
    }

    #[inline]
    fn slot(&self, step: i64) -> usize {
        // len fits i64 for any buffer we can allocate
        step.rem_euclid(self.values.len() as i64) as usize
    }

    /// Accumulate `value` for `step`
    pub fn add_value(&mut self, step: i64, value: f64) {
        let slot = self.slot(step);
        self.values[slot] += value;
    }

    /// Count pending for `step`, left in place
    pub fn value(&self, step: i64) -> f64 {
        self.values[self.slot(step)]
    }

    /// Read and clear the count for `step`
    pub fn get_value(&mut self, step: i64) -> f64 {
        let slot = self.slot(step);
        std::mem::take(&mut self.values[slot])
    }

    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// No pending counts in any slot
    pub fn is_clear(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_clears_slot() {
        let mut buffer = RingBuffer::new(4).unwrap();
        buffer.add_value(6, 1.0);
        buffer.add_value(6, 2.0);
        assert_eq!(buffer.value(6), 3.0);
        assert_eq!(buffer.get_value(6), 3.0);
        assert_eq!(buffer.get_value(6), 0.0);
        assert!(buffer.is_clear());
    }

    #[test]
    fn test_wraps_by_absolute_step() {
        let mut buffer = RingBuffer::new(3).unwrap();
        buffer.add_value(1, 1.0);
        assert_eq!(buffer.get_value(4), 1.0);
        buffer.add_value(-1, 5.0);
        assert_eq!(buffer.get_value(2), 5.0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(RingBuffer::new(0), Err(ConfigurationError::EmptyRingBuffer));
    }
}
