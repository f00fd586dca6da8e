// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # stdp-observability
//!
//! Logging setup shared by the workspace tools, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: daily-rolling JSON log files per run, with retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Workspace crate names accepted by the debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "stdp-plasticity",
    "stdp-runtime",
    "stdp-config",
    "stdp-observability",
    "pairing-experiment",
];
