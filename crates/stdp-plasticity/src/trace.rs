// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Trace state owned by one connection or one unit

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, InvariantViolation};
use crate::status::{Status, StatusValue};

/// Decaying traces plus the current weight
///
/// Aliases used across model variants:
/// - `trace_pre_fast`: `Kplus`, `r1`, `Zplus`
/// - `trace_pre_slow`: `Kplus_triplet`, `r2`
/// - `trace_post_fast`: `Kminus`, `o1`, `Zminus`
/// - `trace_post_slow`: `Kminus_triplet`, `o2`, `Zslow`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceState {
    pub weight: f64,
    pub trace_pre_fast: f64,
    pub trace_pre_slow: f64,
    pub trace_post_fast: f64,
    pub trace_post_slow: f64,
    /// Present only on the long-range homeostatic unit
    pub long_range: Option<LongRangeState>,
}

/// Extra state of the long-range homeostatic unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongRangeState {
    /// Homeostatic reference weight
    pub weight_ref: f64,
    /// Slow calcium-like integrator
    #[serde(rename = "C")]
    pub c: f64,
    /// Depression amplitude
    #[serde(rename = "B")]
    pub b: f64,
    /// Post-synaptic trace feeding `C`
    #[serde(rename = "Zht")]
    pub zht: f64,
}

impl Default for LongRangeState {
    fn default() -> Self {
        Self {
            weight_ref: 1.0,
            c: 0.0,
            b: 5e-3,
            zht: 0.0,
        }
    }
}

impl TraceState {
    /// Zero traces at the given weight
    pub fn with_weight(weight: f64) -> Self {
        Self {
            weight,
            ..Default::default()
        }
    }

    /// Zero traces with the long-range extension attached
    pub fn long_range(weight: f64) -> Self {
        Self {
            weight,
            long_range: Some(LongRangeState::default()),
            ..Default::default()
        }
    }

    /// Reject negative (or NaN) traces
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut traces = vec![
            ("trace_pre_fast", self.trace_pre_fast),
            ("trace_pre_slow", self.trace_pre_slow),
            ("trace_post_fast", self.trace_post_fast),
            ("trace_post_slow", self.trace_post_slow),
        ];
        if let Some(long_range) = &self.long_range {
            traces.push(("Zht", long_range.zht));
            traces.push(("C", long_range.c));
        }
        for (name, value) in traces {
            if !(value >= 0.0) {
                return Err(InvariantViolation::NegativeTrace { name, value });
            }
        }
        Ok(())
    }

    /// Write the weight and traces under their canonical keys
    pub fn write_status(&self, status: &mut Status) {
        status.insert("weight".into(), self.weight.into());
        status.insert("trace_pre_fast".into(), self.trace_pre_fast.into());
        status.insert("trace_pre_slow".into(), self.trace_pre_slow.into());
        status.insert("trace_post_fast".into(), self.trace_post_fast.into());
        status.insert("trace_post_slow".into(), self.trace_post_slow.into());
        if let Some(long_range) = &self.long_range {
            status.insert("weight_ref".into(), long_range.weight_ref.into());
            status.insert("B".into(), long_range.b.into());
            status.insert("C".into(), long_range.c.into());
            status.insert("Zht".into(), long_range.zht.into());
        }
    }

    /// Apply one canonical state entry; `Ok(false)` if the key is not state
    ///
    /// Values are not checked here; call [`TraceState::validate`] once all
    /// entries are applied.
    pub fn apply(&mut self, key: &str, value: &StatusValue) -> Result<bool, ConfigurationError> {
        let target = match key {
            "weight" => &mut self.weight,
            "trace_pre_fast" => &mut self.trace_pre_fast,
            "trace_pre_slow" => &mut self.trace_pre_slow,
            "trace_post_fast" => &mut self.trace_post_fast,
            "trace_post_slow" => &mut self.trace_post_slow,
            _ => match (key, self.long_range.as_mut()) {
                ("weight_ref", Some(long_range)) => &mut long_range.weight_ref,
                ("B", Some(long_range)) => &mut long_range.b,
                ("C", Some(long_range)) => &mut long_range.c,
                ("Zht", Some(long_range)) => &mut long_range.zht,
                _ => return Ok(false),
            },
        };
        *target = value.as_f64(key)?;
        Ok(true)
    }
}
