// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rule parameters
//!
//! Parameter sets are plain `Copy` data. They are validated as a whole whenever
//! they are constructed or changed through a status update, and are immutable
//! in between.

use serde::{Deserialize, Serialize};

use crate::bounded::BoundedWeight;
use crate::decay::DecayModel;
use crate::error::ConfigurationError;
use crate::rule::RulePolicy;
use crate::status::{Status, StatusValue};

/// Parameters of the pair/triplet rule family
///
/// Defaults follow the visual cortex fit of Pfister & Gerstner (2006), with all
/// amplitudes set to `0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripletParameters {
    /// Fast pre-synaptic trace time constant (ms)
    pub tau_plus: f64,
    /// Slow pre-synaptic trace time constant (ms)
    pub tau_plus_triplet: f64,
    /// Fast post-synaptic trace time constant (ms)
    pub tau_minus: f64,
    /// Slow post-synaptic trace time constant (ms)
    pub tau_minus_triplet: f64,
    #[serde(rename = "A_plus")]
    pub a_plus: f64,
    #[serde(rename = "A_minus")]
    pub a_minus: f64,
    #[serde(rename = "A_plus_triplet")]
    pub a_plus_triplet: f64,
    #[serde(rename = "A_minus_triplet")]
    pub a_minus_triplet: f64,
    #[serde(rename = "Wmin")]
    pub w_min: f64,
    #[serde(rename = "Wmax")]
    pub w_max: f64,
    /// Cap every trace at `1.0` after its increment
    pub nearest_spike_only: bool,
    pub rule: RulePolicy,
}

impl Default for TripletParameters {
    fn default() -> Self {
        Self {
            tau_plus: 16.8,
            tau_plus_triplet: 101.0,
            tau_minus: 33.7,
            tau_minus_triplet: 125.0,
            a_plus: 0.1,
            a_minus: 0.1,
            a_plus_triplet: 0.1,
            a_minus_triplet: 0.1,
            w_min: 0.0,
            w_max: 100.0,
            nearest_spike_only: false,
            rule: RulePolicy::Triplet,
        }
    }
}

/// Check `tau > 0` (NaN fails too)
fn positive_tau(name: &'static str, value: f64, errors: &mut Vec<ConfigurationError>) {
    if !(value > 0.0) {
        errors.push(ConfigurationError::NonPositiveTimeConstant { name, value });
    }
}

fn finite(name: &'static str, value: f64, errors: &mut Vec<ConfigurationError>) {
    if !value.is_finite() {
        errors.push(ConfigurationError::NonFinite { name, value });
    }
}

fn slower(
    triplet: (&'static str, f64),
    pair: (&'static str, f64),
    errors: &mut Vec<ConfigurationError>,
) {
    if !(triplet.1 > pair.1) {
        errors.push(ConfigurationError::TripletNotSlower {
            triplet: triplet.0,
            triplet_value: triplet.1,
            pair: pair.0,
            pair_value: pair.1,
        });
    }
}

fn set_number(
    target: &mut f64,
    key: &str,
    value: &StatusValue,
) -> Result<bool, ConfigurationError> {
    *target = value.as_f64(key)?;
    Ok(true)
}

impl TripletParameters {
    pub fn bounds(&self) -> BoundedWeight {
        BoundedWeight {
            min: self.w_min,
            max: self.w_max,
        }
    }

    /// Trace time constants as a decay model
    pub fn decay_model(&self) -> DecayModel {
        DecayModel {
            tau_pre_fast: self.tau_plus,
            tau_pre_slow: self.tau_plus_triplet,
            tau_post_fast: self.tau_minus,
            tau_post_slow: self.tau_minus_triplet,
            tau_ht: None,
        }
    }

    /// Effective nearest-spike restriction (flag or policy)
    pub fn nearest_spike(&self) -> bool {
        self.nearest_spike_only || self.rule.forces_nearest_spike()
    }

    /// Every problem with this parameter set, in declaration order
    pub fn validation_errors(&self) -> Vec<ConfigurationError> {
        let mut errors = Vec::new();
        positive_tau("tau_plus", self.tau_plus, &mut errors);
        positive_tau("tau_plus_triplet", self.tau_plus_triplet, &mut errors);
        positive_tau("tau_minus", self.tau_minus, &mut errors);
        positive_tau("tau_minus_triplet", self.tau_minus_triplet, &mut errors);
        slower(
            ("tau_plus_triplet", self.tau_plus_triplet),
            ("tau_plus", self.tau_plus),
            &mut errors,
        );
        slower(
            ("tau_minus_triplet", self.tau_minus_triplet),
            ("tau_minus", self.tau_minus),
            &mut errors,
        );
        finite("A_plus", self.a_plus, &mut errors);
        finite("A_minus", self.a_minus, &mut errors);
        finite("A_plus_triplet", self.a_plus_triplet, &mut errors);
        finite("A_minus_triplet", self.a_minus_triplet, &mut errors);
        if let Err(err) = self.bounds().validate() {
            errors.push(err);
        }
        errors
    }

    /// First problem with this parameter set, if any
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply one canonical status entry; `Ok(false)` if the key is not a parameter
    pub fn apply(&mut self, key: &str, value: &StatusValue) -> Result<bool, ConfigurationError> {
        match key {
            "tau_plus" => set_number(&mut self.tau_plus, key, value),
            "tau_plus_triplet" => set_number(&mut self.tau_plus_triplet, key, value),
            "tau_minus" => set_number(&mut self.tau_minus, key, value),
            "tau_minus_triplet" => set_number(&mut self.tau_minus_triplet, key, value),
            "A_plus" => set_number(&mut self.a_plus, key, value),
            "A_minus" => set_number(&mut self.a_minus, key, value),
            "A_plus_triplet" => set_number(&mut self.a_plus_triplet, key, value),
            "A_minus_triplet" => set_number(&mut self.a_minus_triplet, key, value),
            "Wmin" => set_number(&mut self.w_min, key, value),
            "Wmax" => set_number(&mut self.w_max, key, value),
            "nearest_spike_only" => {
                self.nearest_spike_only = value.as_bool(key)?;
                Ok(true)
            }
            "rule" => {
                self.rule = value.as_text(key)?.parse()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Write every parameter into `status` under its canonical key
    pub fn write_status(&self, status: &mut Status) {
        let entries: [(&str, StatusValue); 12] = [
            ("tau_plus", self.tau_plus.into()),
            ("tau_plus_triplet", self.tau_plus_triplet.into()),
            ("tau_minus", self.tau_minus.into()),
            ("tau_minus_triplet", self.tau_minus_triplet.into()),
            ("A_plus", self.a_plus.into()),
            ("A_minus", self.a_minus.into()),
            ("A_plus_triplet", self.a_plus_triplet.into()),
            ("A_minus_triplet", self.a_minus_triplet.into()),
            ("Wmin", self.w_min.into()),
            ("Wmax", self.w_max.into()),
            ("nearest_spike_only", self.nearest_spike_only.into()),
            ("rule", self.rule.name().into()),
        ];
        status.extend(entries.into_iter().map(|(k, v)| (k.to_string(), v)));
    }
}

/// Parameters of the long-timescale homeostatic rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongRangeParameters {
    /// Pre-synaptic trace `Zplus` (ms)
    pub tau_plus: f64,
    /// Slow post-synaptic trace `Zslow` (ms)
    pub tau_slow: f64,
    /// Fast post-synaptic trace `Zminus` (ms)
    pub tau_minus: f64,
    /// Post-synaptic trace `Zht` feeding `C` (ms)
    pub tau_ht: f64,
    /// Decay of `C` (ms)
    pub tau_hom: f64,
    /// Relaxation of `weight_ref` (ms)
    pub tau_const: f64,
    /// LTP amplitude
    #[serde(rename = "A")]
    pub a: f64,
    /// Strength of the cubic pull on `weight_ref`
    #[serde(rename = "P")]
    pub p: f64,
    /// Upper fixed point of `weight_ref`
    #[serde(rename = "WP")]
    pub wp: f64,
    /// Heterosynaptic amplitude
    pub beta: f64,
    /// Transmitter-induced drift per pre-synaptic spike
    pub delta: f64,
    #[serde(rename = "Wmin")]
    pub w_min: f64,
    #[serde(rename = "Wmax")]
    pub w_max: f64,
    pub nearest_spike_only: bool,
}

impl Default for LongRangeParameters {
    fn default() -> Self {
        Self {
            tau_plus: 20.0,
            tau_slow: 100.0,
            tau_minus: 20.0,
            tau_ht: 100.0,
            tau_hom: 1_200_000.0,
            tau_const: 1_200_000.0,
            a: 5e-3,
            p: 20.0,
            wp: 0.5,
            beta: 0.05,
            delta: 2e-5,
            w_min: 0.0,
            w_max: 100.0,
            nearest_spike_only: false,
        }
    }
}

impl LongRangeParameters {
    pub fn bounds(&self) -> BoundedWeight {
        BoundedWeight {
            min: self.w_min,
            max: self.w_max,
        }
    }

    /// `Zplus`, `Zminus`, `Zslow` and `Zht`
    ///
    /// The long-range rule has no slow pre-synaptic trace; its slot decays with
    /// `tau_plus` and stays at zero.
    pub fn decay_model(&self) -> DecayModel {
        DecayModel {
            tau_pre_fast: self.tau_plus,
            tau_pre_slow: self.tau_plus,
            tau_post_fast: self.tau_minus,
            tau_post_slow: self.tau_slow,
            tau_ht: Some(self.tau_ht),
        }
    }

    pub fn validation_errors(&self) -> Vec<ConfigurationError> {
        let mut errors = Vec::new();
        positive_tau("tau_plus", self.tau_plus, &mut errors);
        positive_tau("tau_slow", self.tau_slow, &mut errors);
        positive_tau("tau_minus", self.tau_minus, &mut errors);
        positive_tau("tau_ht", self.tau_ht, &mut errors);
        positive_tau("tau_hom", self.tau_hom, &mut errors);
        positive_tau("tau_const", self.tau_const, &mut errors);
        slower(
            ("tau_slow", self.tau_slow),
            ("tau_minus", self.tau_minus),
            &mut errors,
        );
        finite("A", self.a, &mut errors);
        finite("P", self.p, &mut errors);
        finite("WP", self.wp, &mut errors);
        finite("beta", self.beta, &mut errors);
        finite("delta", self.delta, &mut errors);
        if let Err(err) = self.bounds().validate() {
            errors.push(err);
        }
        errors
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.validation_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply one canonical status entry; `Ok(false)` if the key is not a parameter
    pub fn apply(&mut self, key: &str, value: &StatusValue) -> Result<bool, ConfigurationError> {
        match key {
            "tau_plus" => set_number(&mut self.tau_plus, key, value),
            "tau_slow" => set_number(&mut self.tau_slow, key, value),
            "tau_minus" => set_number(&mut self.tau_minus, key, value),
            "tau_ht" => set_number(&mut self.tau_ht, key, value),
            "tau_hom" => set_number(&mut self.tau_hom, key, value),
            "tau_const" => set_number(&mut self.tau_const, key, value),
            "A" => set_number(&mut self.a, key, value),
            "P" => set_number(&mut self.p, key, value),
            "WP" => set_number(&mut self.wp, key, value),
            "beta" => set_number(&mut self.beta, key, value),
            "delta" => set_number(&mut self.delta, key, value),
            "Wmin" => set_number(&mut self.w_min, key, value),
            "Wmax" => set_number(&mut self.w_max, key, value),
            "nearest_spike_only" => {
                self.nearest_spike_only = value.as_bool(key)?;
                Ok(true)
            }
            "rule" => match value.as_text(key)?.parse::<RulePolicy>()? {
                RulePolicy::LongRangeHomeostatic => Ok(true),
                other => Err(ConfigurationError::UnsupportedRule {
                    rule: other.name(),
                    model: "stdp_long_neuron",
                }),
            },
            _ => Ok(false),
        }
    }

    pub fn write_status(&self, status: &mut Status) {
        let entries: [(&str, StatusValue); 15] = [
            ("tau_plus", self.tau_plus.into()),
            ("tau_slow", self.tau_slow.into()),
            ("tau_minus", self.tau_minus.into()),
            ("tau_ht", self.tau_ht.into()),
            ("tau_hom", self.tau_hom.into()),
            ("tau_const", self.tau_const.into()),
            ("A", self.a.into()),
            ("P", self.p.into()),
            ("WP", self.wp.into()),
            ("beta", self.beta.into()),
            ("delta", self.delta.into()),
            ("Wmin", self.w_min.into()),
            ("Wmax", self.w_max.into()),
            ("nearest_spike_only", self.nearest_spike_only.into()),
            ("rule", RulePolicy::LongRangeHomeostatic.name().into()),
        ];
        status.extend(entries.into_iter().map(|(k, v)| (k.to_string(), v)));
    }
}
