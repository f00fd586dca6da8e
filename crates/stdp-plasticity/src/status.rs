// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Status dictionaries exchanged with the host
//!
//! Keys are the canonical parameter and state names. Setting also accepts the
//! historical aliases used by older model revisions; reading always reports the
//! canonical name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// One status entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Double(f64),
    Text(String),
}

/// Key/value view of parameters and state
pub type Status = BTreeMap<String, StatusValue>;

impl StatusValue {
    pub fn as_f64(&self, key: &str) -> Result<f64, ConfigurationError> {
        match self {
            StatusValue::Double(value) => Ok(*value),
            _ => Err(ConfigurationError::WrongType {
                key: key.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn as_bool(&self, key: &str) -> Result<bool, ConfigurationError> {
        match self {
            StatusValue::Bool(value) => Ok(*value),
            _ => Err(ConfigurationError::WrongType {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }

    pub fn as_text(&self, key: &str) -> Result<&str, ConfigurationError> {
        match self {
            StatusValue::Text(value) => Ok(value),
            _ => Err(ConfigurationError::WrongType {
                key: key.to_string(),
                expected: "text",
            }),
        }
    }
}

impl From<f64> for StatusValue {
    fn from(value: f64) -> Self {
        StatusValue::Double(value)
    }
}

impl From<bool> for StatusValue {
    fn from(value: bool) -> Self {
        StatusValue::Bool(value)
    }
}

impl From<&str> for StatusValue {
    fn from(value: &str) -> Self {
        StatusValue::Text(value.to_string())
    }
}

impl From<String> for StatusValue {
    fn from(value: String) -> Self {
        StatusValue::Text(value)
    }
}

/// Map an alias to its canonical key; canonical and unknown keys pass through
///
/// # Example
/// ```
/// use stdp_plasticity::canonical_key;
///
/// assert_eq!(canonical_key("tau_x"), "tau_plus_triplet");
/// assert_eq!(canonical_key("Kminus"), "trace_post_fast");
/// assert_eq!(canonical_key("tau_plus"), "tau_plus");
/// ```
pub fn canonical_key(key: &str) -> &str {
    match key {
        "tau_x" => "tau_plus_triplet",
        "tau_y" => "tau_minus_triplet",
        "Aplus" | "a2_plus" => "A_plus",
        "Aminus" | "a2_minus" => "A_minus",
        "Aplus_triplet" | "a3_plus" => "A_plus_triplet",
        "Aminus_triplet" | "a3_minus" => "A_minus_triplet",
        "nearest_spike" => "nearest_spike_only",
        "Kplus" | "r1" | "Zplus" => "trace_pre_fast",
        "Kplus_triplet" | "r2" => "trace_pre_slow",
        "Kminus" | "o1" | "Zminus" => "trace_post_fast",
        "Kminus_triplet" | "o2" | "Zslow" => "trace_post_slow",
        other => other,
    }
}

/// Build a status from `(key, value)` pairs
///
/// # Example
/// ```
/// use stdp_plasticity::status::status_from;
///
/// let status = status_from([("weight", 0.5.into()), ("nearest_spike", true.into())]);
/// assert_eq!(status.len(), 2);
/// ```
pub fn status_from<I, K>(entries: I) -> Status
where
    I: IntoIterator<Item = (K, StatusValue)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch() {
        let value = StatusValue::Bool(true);
        assert!(value.as_f64("weight").is_err());
        assert_eq!(value.as_bool("nearest_spike_only"), Ok(true));
    }

    #[test]
    fn test_all_trace_aliases() {
        for alias in ["Kplus", "r1", "Zplus"] {
            assert_eq!(canonical_key(alias), "trace_pre_fast");
        }
        for alias in ["Kminus_triplet", "o2", "Zslow"] {
            assert_eq!(canonical_key(alias), "trace_post_slow");
        }
    }

    #[test]
    fn test_unknown_key_passes_through() {
        assert_eq!(canonical_key("not_a_key"), "not_a_key");
    }
}
