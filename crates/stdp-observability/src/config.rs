// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Per-run log files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLogging {
    /// Base directory holding one `run_<timestamp>` folder per run
    pub dir: PathBuf,
    /// Remove runs older than this many days
    pub retention_days: u32,
    /// Keep at most this many runs
    pub retention_runs: usize,
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

/// Logging setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Level for everything not raised by a debug flag
    pub level: String,
    pub format: LogFormat,
    /// Only honoured with the `file-logging` feature
    pub file: Option<FileLogging>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}
