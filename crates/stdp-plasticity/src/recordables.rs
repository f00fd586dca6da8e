// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Quantities a data logger can sample once per step

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::trace::TraceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recordable {
    Weight,
    TracePreFast,
    TracePreSlow,
    TracePostFast,
    TracePostSlow,
    WeightRef,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "Zht")]
    Zht,
}

impl Recordable {
    /// Recordables of a triplet-family unit
    pub const TRIPLET: [Recordable; 5] = [
        Recordable::Weight,
        Recordable::TracePreFast,
        Recordable::TracePreSlow,
        Recordable::TracePostFast,
        Recordable::TracePostSlow,
    ];

    /// Recordables of a long-range homeostatic unit
    pub const LONG_RANGE: [Recordable; 8] = [
        Recordable::Weight,
        Recordable::TracePreFast,
        Recordable::TracePostFast,
        Recordable::TracePostSlow,
        Recordable::WeightRef,
        Recordable::B,
        Recordable::C,
        Recordable::Zht,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Recordable::Weight => "weight",
            Recordable::TracePreFast => "trace_pre_fast",
            Recordable::TracePreSlow => "trace_pre_slow",
            Recordable::TracePostFast => "trace_post_fast",
            Recordable::TracePostSlow => "trace_post_slow",
            Recordable::WeightRef => "weight_ref",
            Recordable::B => "B",
            Recordable::C => "C",
            Recordable::Zht => "Zht",
        }
    }

    /// Resolve a canonical name or a trace alias
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        let recordable = match crate::status::canonical_key(name) {
            "weight" => Recordable::Weight,
            "trace_pre_fast" => Recordable::TracePreFast,
            "trace_pre_slow" => Recordable::TracePreSlow,
            "trace_post_fast" => Recordable::TracePostFast,
            "trace_post_slow" => Recordable::TracePostSlow,
            "weight_ref" => Recordable::WeightRef,
            "B" => Recordable::B,
            "C" => Recordable::C,
            "Zht" => Recordable::Zht,
            _ => return Err(ConfigurationError::UnknownKey(name.to_string())),
        };
        Ok(recordable)
    }

    /// Sample from `state`; `None` for long-range quantities on a triplet state
    pub fn value(self, state: &TraceState) -> Option<f64> {
        match self {
            Recordable::Weight => Some(state.weight),
            Recordable::TracePreFast => Some(state.trace_pre_fast),
            Recordable::TracePreSlow => Some(state.trace_pre_slow),
            Recordable::TracePostFast => Some(state.trace_post_fast),
            Recordable::TracePostSlow => Some(state.trace_post_slow),
            Recordable::WeightRef => state.long_range.map(|l| l.weight_ref),
            Recordable::B => state.long_range.map(|l| l.b),
            Recordable::C => state.long_range.map(|l| l.c),
            Recordable::Zht => state.long_range.map(|l| l.zht),
        }
    }
}

impl fmt::Display for Recordable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
