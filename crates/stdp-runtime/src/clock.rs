// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed simulation clock

use serde::{Deserialize, Serialize};
use stdp_plasticity::{ConfigurationError, SimulationClock};

/// Constant resolution and delay bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedClock {
    resolution_ms: f64,
    min_delay_steps: i64,
    max_delay_steps: i64,
}

impl FixedClock {
    pub fn new(
        resolution_ms: f64,
        min_delay_steps: i64,
        max_delay_steps: i64,
    ) -> Result<Self, ConfigurationError> {
        if !(resolution_ms > 0.0) || !resolution_ms.is_finite() {
            return Err(ConfigurationError::InvalidResolution(resolution_ms));
        }
        if min_delay_steps < 1 {
            return Err(ConfigurationError::InvalidMinDelay(min_delay_steps));
        }
        Ok(Self {
            resolution_ms,
            min_delay_steps,
            max_delay_steps: max_delay_steps.max(min_delay_steps),
        })
    }

    /// First step at or after `t_ms`
    pub fn ms_to_step(&self, t_ms: f64) -> i64 {
        // tolerate round-off for times that sit on the grid
        (t_ms / self.resolution_ms - 1e-9).ceil() as i64
    }

    pub fn step_to_ms(&self, step: i64) -> f64 {
        step as f64 * self.resolution_ms
    }
}

impl SimulationClock for FixedClock {
    fn resolution_ms(&self) -> f64 {
        self.resolution_ms
    }

    fn min_delay_steps(&self) -> i64 {
        self.min_delay_steps
    }

    fn max_delay_steps(&self) -> i64 {
        self.max_delay_steps
    }
}
