// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for plasticity operations
//!
//! Two families reach the caller:
//! - [`ConfigurationError`]: a rejected parameter set, raised before any state changes
//! - [`InvariantViolation`]: a broken ordering or state guarantee, fatal for the operation
//!
//! Weight clamping into `[Wmin, Wmax]` is steady-state behaviour and never shows up here.

use thiserror::Error;

/// Invalid parameter relationships and unknown names
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Time constant {name} must be positive (got {value})")]
    NonPositiveTimeConstant { name: &'static str, value: f64 },

    #[error(
        "Time constant {triplet} ({triplet_value}) must be bigger than pair-based one {pair} ({pair_value})"
    )]
    TripletNotSlower {
        triplet: &'static str,
        triplet_value: f64,
        pair: &'static str,
        pair_value: f64,
    },

    #[error("Weight bounds are inverted: Wmin = {min} is above Wmax = {max}")]
    InvertedBounds { min: f64, max: f64 },

    #[error("Weight {weight} lies outside [{min}, {max}]")]
    WeightOutOfBounds { weight: f64, min: f64, max: f64 },

    #[error("Parameter {name} must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Unknown status key: {0}")]
    UnknownKey(String),

    #[error("Status key {key} expects a {expected} value")]
    WrongType { key: String, expected: &'static str },

    #[error("Unknown rule policy: {0}")]
    UnknownRule(String),

    #[error("Rule policy {rule} is not supported by {model}")]
    UnsupportedRule {
        rule: &'static str,
        model: &'static str,
    },

    #[error("Unknown receptor port {port} for {model}")]
    UnknownReceptor { port: u32, model: &'static str },

    #[error("Simulation resolution must be positive (got {0} ms)")]
    InvalidResolution(f64),

    #[error("Minimum delay must be at least one step (got {0})")]
    InvalidMinDelay(i64),

    #[error("Connection delay must be positive (got {0} ms)")]
    InvalidDelay(f64),

    #[error("Ring buffer needs at least one slot")]
    EmptyRingBuffer,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    #[error("No connection at index {0}")]
    UnknownConnection(usize),
}

/// Broken guarantees from the environment or the caller
///
/// These abort the offending operation. The owning state is left exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("Negative elapsed time: {from} ms -> {to} ms")]
    NegativeElapsed { from: f64, to: f64 },

    #[error("Post-synaptic history out of order: {current} ms follows {previous} ms")]
    NonMonotonicHistory { previous: f64, current: f64 },

    #[error("Trace {name} must be non-negative (got {value})")]
    NegativeTrace { name: &'static str, value: f64 },

    #[error("Invalid step window [{from}, {to}) for min_delay {min_delay}")]
    InvalidStepWindow { from: i64, to: i64, min_delay: i64 },

    #[error("Clock-driven updater used before calibration")]
    NotCalibrated,

    #[error("Spike due at step {step} lies outside the buffered steps [{first}, {end})")]
    DeliveryOutsideHorizon { step: i64, first: i64, end: i64 },

    #[error("Update window starts at step {start} but step {expected} is next")]
    StepOutOfOrder { start: i64, expected: i64 },
}

/// Any failure raised by this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlasticityError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl PlasticityError {
    /// Invariant violations are not recoverable by the caller
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlasticityError::Invariant(_))
    }
}

/// Result type for plasticity operations
pub type Result<T> = core::result::Result<T, PlasticityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let config: PlasticityError = ConfigurationError::InvertedBounds { min: 2.0, max: 1.0 }.into();
        let invariant: PlasticityError = InvariantViolation::NotCalibrated.into();
        assert!(!config.is_fatal());
        assert!(invariant.is_fatal());
    }

    #[test]
    fn test_messages_name_the_parameters() {
        let err = ConfigurationError::TripletNotSlower {
            triplet: "tau_plus_triplet",
            triplet_value: 1.0,
            pair: "tau_plus",
            pair_value: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("tau_plus_triplet"));
        assert!(msg.contains("tau_plus "));
    }
}
