// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hard weight bounds
//!
//! Applied right after every additive weight update, before the weight is sent
//! downstream or read back through a status query. The clamp is total: once the
//! bounds are validated it cannot fail.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigurationError;

/// Closed weight interval `[Wmin, Wmax]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedWeight {
    #[serde(rename = "Wmin")]
    pub min: f64,
    #[serde(rename = "Wmax")]
    pub max: f64,
}

impl Default for BoundedWeight {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl BoundedWeight {
    /// Validated bounds
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigurationError> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// `Wmin <= Wmax`, neither NaN
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min.is_nan() {
            return Err(ConfigurationError::NonFinite {
                name: "Wmin",
                value: self.min,
            });
        }
        if self.max.is_nan() {
            return Err(ConfigurationError::NonFinite {
                name: "Wmax",
                value: self.max,
            });
        }
        if self.max < self.min {
            return Err(ConfigurationError::InvertedBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Clamp `weight` into the interval
    ///
    /// # Example
    /// ```
    /// use stdp_plasticity::BoundedWeight;
    ///
    /// let bounds = BoundedWeight::new(0.0, 2.0).unwrap();
    /// assert_eq!(bounds.clamp(-0.3), 0.0);
    /// assert_eq!(bounds.clamp(2.5), 2.0);
    /// assert_eq!(bounds.clamp(1.2), 1.2);
    /// ```
    #[inline]
    pub fn clamp(&self, weight: f64) -> f64 {
        if weight < self.min {
            trace!(weight, wmin = self.min, "weight clamped to lower bound");
            self.min
        } else if weight > self.max {
            trace!(weight, wmax = self.max, "weight clamped to upper bound");
            self.max
        } else {
            weight
        }
    }

    /// Whether `weight` already lies inside the interval
    #[inline]
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min && weight <= self.max
    }

    /// Fail with a configuration error when `weight` lies outside the interval
    pub fn check(&self, weight: f64) -> Result<(), ConfigurationError> {
        if self.contains(weight) {
            Ok(())
        } else {
            Err(ConfigurationError::WeightOutOfBounds {
                weight,
                min: self.min,
                max: self.max,
            })
        }
    }
}
