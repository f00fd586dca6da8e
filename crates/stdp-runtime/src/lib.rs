// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # STDP Runtime
//!
//! Reference implementations of the host collaborators the plasticity engine
//! talks to:
//! - [`SpikeArchive`]: access-counted post-synaptic history with concurrent cursors
//! - [`FixedClock`]: constant resolution and delay bounds
//! - [`SliceScheduler`]: dispatches blocks of `min_delay` steps to a clock-driven unit
//! - [`SpikeCollector`]: routing sink stamping spikes with their absolute step
//! - [`Multimeter`]: per-step recorder of selected recordables

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod archive;
pub mod clock;
pub mod collector;
pub mod multimeter;
pub mod scheduler;

pub use archive::{HistoryCursor, SpikeArchive};
pub use clock::FixedClock;
pub use collector::{SpikeCollector, StampedSpike};
pub use multimeter::{Multimeter, Sample};
pub use scheduler::SliceScheduler;
