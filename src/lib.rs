// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # triplet-stdp
//!
//! Spike-timing-dependent plasticity with pair and triplet terms, for
//! simulators that either step every synapse on a fixed clock or update a
//! connection only when its pre-synaptic neuron fires.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! triplet-stdp = "0.0.1-beta.18"  # Default: runtime + config + observability
//! ```
//!
//! ## Feature Flags
//!
//! - **`runtime`** (default): in-process spike archive, clock, scheduler, recorders
//! - **`config`** (default): `stdp_configuration.toml` loader with overrides
//! - **`observability`** (default): logging setup and per-crate debug flags
//! - **`file-logging`**: rolling JSON log files per run
//!
//! ## Usage Examples
//!
//! ### Event-driven connection
//!
//! ```rust
//! use triplet_stdp::prelude::*;
//! use triplet_stdp::runtime::SpikeArchive;
//!
//! let archive = SpikeArchive::new();
//! let mut connection = EventDrivenUpdater::new(
//!     TripletParameters::default(),
//!     1.0,
//!     ConnectionSettings::default(),
//! )?;
//! connection.check_connection(&archive, 0.0);
//!
//! archive.record_spike(4.0)?;
//! let mut sink: Vec<OutgoingSpike> = Vec::new();
//! let spike = PreSynapticSpike { t_spike: 10.0, t_lastspike: 0.0, multiplicity: 1 };
//! let weight = connection.send(spike, &archive, &mut sink)?;
//! assert_eq!(sink[0].weight, weight);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Clock-driven unit
//!
//! ```rust
//! use triplet_stdp::prelude::*;
//! use triplet_stdp::runtime::{FixedClock, SliceScheduler, SpikeCollector};
//!
//! let mut scheduler = SliceScheduler::new(FixedClock::new(0.1, 10, 20)?);
//! let mut unit = ClockDrivenUpdater::new_triplet(TripletParameters::default(), 1.0)?;
//! scheduler.prepare(&mut unit)?;
//!
//! scheduler.schedule_at_ms(ReceptorPort::Pre, 1.0)?;
//! scheduler.schedule_at_ms(ReceptorPort::Post, 3.0)?;
//! let mut collector = SpikeCollector::new();
//! scheduler.run_for_ms(5.0, &mut unit, &mut collector, &mut NullLogger)?;
//! assert!(unit.weight() > 1.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Core: stdp-plasticity                                  │
//! │  (TraceState, DecayModel, rules, updaters)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Host: stdp-runtime                                     │
//! │  (spike archive, clock, scheduler, recorders)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: stdp-config, stdp-observability        │
//! │  (TOML + overrides, logging)                            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use stdp_plasticity as plasticity;

#[cfg(feature = "runtime")]
pub use stdp_runtime as runtime;

#[cfg(feature = "config")]
pub use stdp_config as config;

#[cfg(feature = "observability")]
pub use stdp_observability as observability;

#[cfg(feature = "runtime")]
pub mod pairing;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::plasticity::{
        BoundedWeight, ClockDrivenUpdater, ConnectionBatch, ConnectionSettings, DataLogger,
        DecayModel, EventDrivenUpdater, IncomingSpike, LongRangeParameters, ModelRegistry,
        NullLogger, OutgoingSpike, PlasticityError, PlasticityModel, PreSynapticSpike,
        ReceptorPort, Recordable, RulePolicy, SimulationClock, SpikeHistory, SpikeSink, Status,
        StatusValue, TraceState, TripletParameters, UpdateWindow,
    };

    #[cfg(feature = "runtime")]
    pub use crate::runtime::{FixedClock, Multimeter, SliceScheduler, SpikeArchive, SpikeCollector};

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, validate_config, StdpConfig};
}
