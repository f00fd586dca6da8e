// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exponential trace decay
//!
//! One formula, `exp(-Δt/τ)`, under two contracts:
//! - clock-driven: factors computed once per resolution and reused every step
//! - event-driven: factors computed on demand for whatever interval elapsed
//!
//! A zero interval yields exactly `1.0`; a negative one is rejected.

use crate::error::{ConfigurationError, InvariantViolation};
use crate::trace::TraceState;

/// Decay factor for an elapsed interval `dt >= 0` and time constant `tau > 0`
///
/// # Example
/// ```
/// use stdp_plasticity::decay_factor;
///
/// assert_eq!(decay_factor(0.0, 16.8), 1.0);
/// assert!((decay_factor(16.8, 16.8) - (-1.0f64).exp()).abs() < 1e-15);
/// ```
#[inline]
pub fn decay_factor(dt: f64, tau: f64) -> f64 {
    if dt == 0.0 {
        return 1.0;
    }
    (-dt / tau).exp()
}

/// Time constants of every trace an updater carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayModel {
    pub tau_pre_fast: f64,
    pub tau_pre_slow: f64,
    pub tau_post_fast: f64,
    pub tau_post_slow: f64,
    /// Only the long-range unit has a fifth trace
    pub tau_ht: Option<f64>,
}

/// Multiplicative factors for one interval, one per trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayFactors {
    pub pre_fast: f64,
    pub pre_slow: f64,
    pub post_fast: f64,
    pub post_slow: f64,
    pub ht: f64,
}

impl DecayFactors {
    /// No-op decay
    pub const IDENTITY: DecayFactors = DecayFactors {
        pre_fast: 1.0,
        pre_slow: 1.0,
        post_fast: 1.0,
        post_slow: 1.0,
        ht: 1.0,
    };

    /// Decay every trace of `state` in place; the weight is untouched
    #[inline]
    pub fn apply(&self, state: &mut TraceState) {
        state.trace_pre_fast *= self.pre_fast;
        state.trace_pre_slow *= self.pre_slow;
        state.trace_post_fast *= self.post_fast;
        state.trace_post_slow *= self.post_slow;
        if let Some(long_range) = state.long_range.as_mut() {
            long_range.zht *= self.ht;
        }
    }
}

impl DecayModel {
    /// Factors for an arbitrary interval `dt >= 0` (event-driven contract)
    pub fn factors(&self, dt: f64) -> Result<DecayFactors, InvariantViolation> {
        self.between(0.0, dt)
    }

    /// Factors for the interval from `from` to `to` (ms)
    pub fn between(&self, from: f64, to: f64) -> Result<DecayFactors, InvariantViolation> {
        let dt = to - from;
        if !(dt >= 0.0) {
            return Err(InvariantViolation::NegativeElapsed { from, to });
        }
        Ok(self.interval_factors(dt))
    }

    fn interval_factors(&self, dt: f64) -> DecayFactors {
        if dt == 0.0 {
            return DecayFactors::IDENTITY;
        }
        DecayFactors {
            pre_fast: decay_factor(dt, self.tau_pre_fast),
            pre_slow: decay_factor(dt, self.tau_pre_slow),
            post_fast: decay_factor(dt, self.tau_post_fast),
            post_slow: decay_factor(dt, self.tau_post_slow),
            ht: self.tau_ht.map_or(1.0, |tau| decay_factor(dt, tau)),
        }
    }

    /// Per-step factors for a fixed resolution (clock-driven contract)
    pub fn step_factors(&self, resolution_ms: f64) -> Result<DecayFactors, ConfigurationError> {
        if !(resolution_ms > 0.0) || !resolution_ms.is_finite() {
            return Err(ConfigurationError::InvalidResolution(resolution_ms));
        }
        Ok(self.interval_factors(resolution_ms))
    }
}
