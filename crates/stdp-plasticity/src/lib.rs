// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Triplet STDP Plasticity Engine
//!
//! Synaptic weight plasticity driven by spike triplets, in two deployment modes
//! sharing one trace-decay-and-update core:
//! - **Event-driven** ([`EventDrivenUpdater`]): a connection that replays the
//!   post-synaptic history lazily whenever a pre-synaptic spike arrives
//! - **Clock-driven** ([`ClockDrivenUpdater`]): a unit advancing its traces every
//!   simulation step from spike counts accumulated in ring buffers
//!
//! ## Architecture
//! - [`TraceState`]: the decaying traces and the weight (pure data)
//! - [`DecayModel`]: `exp(-Δt/τ)` factors, precomputed per step or on demand
//! - [`RulePolicy`]: selects pair-based, triplet, nearest-spike or long-range behaviour
//! - [`BoundedWeight`]: clamps the weight into `[Wmin, Wmax]` after every update
//! - [`host`]: traits for the simulator-owned collaborators (history, sink, logger, clock)
//!
//! The host scheduler guarantees that no two updates on one instance interleave;
//! nothing here locks, blocks or suspends.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod batch;
pub mod bounded;
pub mod clock_driven;
pub mod decay;
pub mod error;
pub mod event_driven;
pub mod host;
pub mod params;
pub mod recordables;
pub mod registry;
pub mod ring_buffer;
pub mod rule;
pub mod status;
pub mod trace;

// Re-export key types
pub use batch::ConnectionBatch;
pub use bounded::BoundedWeight;
pub use clock_driven::ClockDrivenUpdater;
pub use decay::{decay_factor, DecayFactors, DecayModel};
pub use error::{ConfigurationError, InvariantViolation, PlasticityError, Result};
pub use event_driven::{ConnectionSettings, EventDrivenUpdater, PreSynapticSpike};
pub use host::{
    DataLogger, HistoryEntry, IncomingSpike, NullLogger, OutgoingSpike, ReceptorPort, Route,
    SimulationClock, SpikeHistory, SpikeSink, UpdateWindow,
};
pub use params::{LongRangeParameters, TripletParameters};
pub use recordables::Recordable;
pub use registry::{ModelConstructor, ModelRegistry, PlasticityModel};
pub use ring_buffer::RingBuffer;
pub use rule::RulePolicy;
pub use status::{canonical_key, Status, StatusValue};
pub use trace::{LongRangeState, TraceState};
