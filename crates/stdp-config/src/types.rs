// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Structs map to sections in `stdp_configuration.toml`. Rule parameters are
//! the plasticity crate's own types, embedded as they are.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stdp_plasticity::{ConnectionSettings, LongRangeParameters, TripletParameters};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StdpConfig {
    pub simulation: SimulationConfig,
    pub triplet: TripletParameters,
    pub long_range: LongRangeParameters,
    pub connection: ConnectionSettings,
    pub logging: LoggingConfig,
}

/// Clock settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step size (ms)
    pub resolution_ms: f64,
    pub min_delay_steps: i64,
    pub max_delay_steps: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution_ms: 0.1,
            min_delay_steps: 1,
            max_delay_steps: 1,
        }
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub retention_days: u32,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            retention_days: 7,
            retention_runs: 10,
        }
    }
}
