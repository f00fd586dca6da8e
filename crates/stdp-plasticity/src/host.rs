// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host collaborator interfaces
//!
//! The updaters never own the simulation clock, the post-synaptic spike
//! history, the routing fabric or the data logger. They reach them through the
//! traits in this module, which the host (or `stdp-runtime`) implements.
//!
//! ## Design Notes
//!
//! - [`SpikeHistory`] hands out a lazy cursor per call (GAT), so many
//!   connections can read one history concurrently through `&self`
//! - Retention of history entries is the implementor's business; the only hook
//!   is [`SpikeHistory::register_connection`]

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, InvariantViolation};
use crate::trace::TraceState;

/// One recorded post-synaptic spike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Spike time (ms)
    pub t: f64,
    /// How many registered readers have consumed this entry so far
    pub access_counter: usize,
}

/// Time-ordered post-synaptic spike record of one target
pub trait SpikeHistory {
    /// Lazy, finite cursor over one slice of the history
    type Cursor<'a>: Iterator<Item = HistoryEntry>
    where
        Self: 'a;

    /// Entries with `t1 < t <= t2`, oldest first
    ///
    /// Every call starts a fresh cursor. Implementations may count the access
    /// for their retention policy.
    fn history_slice(&self, t1: f64, t2: f64) -> Self::Cursor<'_>;

    /// Announce a new reader whose first read will start after `t_first_read`
    fn register_connection(&self, _t_first_read: f64) {}
}

/// Cursor over a plain slice of spike times
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    times: std::slice::Iter<'a, f64>,
    t1: f64,
    t2: f64,
}

impl Iterator for SliceCursor<'_> {
    type Item = HistoryEntry;

    fn next(&mut self) -> Option<HistoryEntry> {
        let (t1, t2) = (self.t1, self.t2);
        self.times
            .by_ref()
            .find(|&&t| t > t1 && t <= t2)
            .map(|&t| HistoryEntry {
                t,
                access_counter: 0,
            })
    }
}

/// A bare list of spike times acts as a history with no retention policy
impl SpikeHistory for [f64] {
    type Cursor<'a> = SliceCursor<'a>;

    fn history_slice(&self, t1: f64, t2: f64) -> SliceCursor<'_> {
        SliceCursor {
            times: self.iter(),
            t1,
            t2,
        }
    }
}

impl SpikeHistory for Vec<f64> {
    type Cursor<'a> = SliceCursor<'a>;

    fn history_slice(&self, t1: f64, t2: f64) -> SliceCursor<'_> {
        self.as_slice().history_slice(t1, t2)
    }
}

/// Where an event-driven connection sends its spike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub delay_ms: f64,
    pub rport: u32,
}

/// Spike handed to the routing fabric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutgoingSpike {
    /// Weight after the update that produced this spike
    pub weight: f64,
    pub multiplicity: u32,
    /// Step offset inside the update window (clock-driven), `0` otherwise
    pub lag: i64,
    /// Connection routing (event-driven only)
    pub route: Option<Route>,
}

/// Routing fabric
pub trait SpikeSink {
    fn emit_spike(&mut self, spike: OutgoingSpike);
}

impl SpikeSink for Vec<OutgoingSpike> {
    fn emit_spike(&mut self, spike: OutgoingSpike) {
        self.push(spike);
    }
}

/// Per-step observation of a clock-driven unit
pub trait DataLogger {
    /// Called once per simulated step, after all updates for that step
    fn record_data(&mut self, step: i64, state: &TraceState);
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl DataLogger for NullLogger {
    fn record_data(&mut self, _step: i64, _state: &TraceState) {}
}

/// Simulation clock as seen by a clock-driven unit
pub trait SimulationClock {
    /// Step size (ms)
    fn resolution_ms(&self) -> f64;

    /// Minimum propagation delay, the longest block dispatched at once (steps)
    fn min_delay_steps(&self) -> i64;

    /// Longest delay any spike can carry (steps)
    fn max_delay_steps(&self) -> i64 {
        self.min_delay_steps()
    }
}

/// Input channel of a clock-driven unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceptorPort {
    /// Pre-synaptic spikes, repeated downstream with the updated weight
    Pre = 0,
    /// Post-synaptic feedback
    Post = 1,
}

impl ReceptorPort {
    pub fn from_port(port: u32, model: &'static str) -> Result<Self, ConfigurationError> {
        match port {
            0 => Ok(ReceptorPort::Pre),
            1 => Ok(ReceptorPort::Post),
            _ => Err(ConfigurationError::UnknownReceptor { port, model }),
        }
    }
}

/// Spike delivered to a clock-driven unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomingSpike {
    pub port: u32,
    /// Absolute step at which the spike takes effect
    pub delivery_step: i64,
    pub multiplicity: u32,
}

/// Block of steps `origin + from .. origin + to` dispatched to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWindow {
    pub origin: i64,
    pub from: i64,
    pub to: i64,
    pub min_delay: i64,
}

impl UpdateWindow {
    /// `0 <= from < to <= min_delay`
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.from < 0 || self.from >= self.to || self.to > self.min_delay {
            return Err(InvariantViolation::InvalidStepWindow {
                from: self.from,
                to: self.to,
                min_delay: self.min_delay,
            });
        }
        Ok(())
    }

    /// Absolute step of every lag in the window
    pub fn steps(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.from..self.to).map(move |lag| (lag, self.origin + lag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_history_is_open_closed() {
        let history = vec![1.0, 2.0, 3.0, 4.0];
        let times: Vec<f64> = history.history_slice(1.0, 3.0).map(|e| e.t).collect();
        assert_eq!(times, vec![2.0, 3.0]);
    }

    #[test]
    fn test_slice_history_restarts_per_call() {
        let history = [5.0, 6.0];
        assert_eq!(history[..].history_slice(0.0, 10.0).count(), 2);
        assert_eq!(history[..].history_slice(0.0, 10.0).count(), 2);
        assert_eq!(history[..].history_slice(6.0, 10.0).count(), 0);
    }

    #[test]
    fn test_window_validation() {
        let ok = UpdateWindow {
            origin: 10,
            from: 0,
            to: 2,
            min_delay: 2,
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.steps().collect::<Vec<_>>(), vec![(0, 10), (1, 11)]);

        for (from, to) in [(1, 1), (2, 1), (-1, 1), (0, 3)] {
            let bad = UpdateWindow { from, to, ..ok };
            assert!(bad.validate().is_err(), "from={from} to={to}");
        }
    }

    #[test]
    fn test_receptor_ports() {
        assert_eq!(ReceptorPort::from_port(0, "unit"), Ok(ReceptorPort::Pre));
        assert_eq!(ReceptorPort::from_port(1, "unit"), Ok(ReceptorPort::Post));
        assert!(ReceptorPort::from_port(2, "unit").is_err());
    }
}
