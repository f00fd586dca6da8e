// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event-driven triplet connection
//!
//! The connection does nothing between pre-synaptic spikes. When one arrives
//! at `t_spike` it replays the target's post-synaptic history recorded since
//! the previous pre-synaptic spike, shifted by the dendritic delay `d`:
//!
//! ```text
//! t_last_post = t_lastspike
//! for t_i in history (t_lastspike - d, t_spike - d]:
//!     decay all traces by (t_i + d) - t_last_post      (skipped when zero)
//!     potentiate, increment post traces
//!     t_last_post = t_i + d
//! decay all traces by t_spike - t_last_post
//! depress, increment pre traces
//! emit the spike with the new weight
//! ```
//!
//! Depression reads the slow pre-synaptic trace after it has been decayed to
//! `t_spike` and before this spike's own increment.

use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::error::{ConfigurationError, InvariantViolation, Result};
use crate::host::{OutgoingSpike, Route, SpikeHistory, SpikeSink};
use crate::params::TripletParameters;
use crate::rule;
use crate::status::{canonical_key, Status, StatusValue};
use crate::trace::TraceState;

const MODEL: &str = "stdp_triplet_synapse";

/// Routing of an event-driven connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Dendritic delay (ms)
    pub delay_ms: f64,
    /// Receptor port on the target
    pub rport: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            delay_ms: 1.0,
            rport: 0,
        }
    }
}

impl ConnectionSettings {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if !(self.delay_ms > 0.0) || !self.delay_ms.is_finite() {
            return Err(ConfigurationError::InvalidDelay(self.delay_ms));
        }
        Ok(())
    }
}

/// A pre-synaptic spike as seen by one connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreSynapticSpike {
    /// Arrival time (ms)
    pub t_spike: f64,
    /// Arrival time of the previous spike on this connection (ms)
    pub t_lastspike: f64,
    pub multiplicity: u32,
}

/// Triplet STDP connection updated only at pre-synaptic spikes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventDrivenUpdater {
    params: TripletParameters,
    state: TraceState,
    settings: ConnectionSettings,
}

impl Default for EventDrivenUpdater {
    fn default() -> Self {
        Self {
            params: TripletParameters::default(),
            state: TraceState::with_weight(1.0),
            settings: ConnectionSettings::default(),
        }
    }
}

fn validate(
    params: &TripletParameters,
    settings: &ConnectionSettings,
    state: &TraceState,
) -> Result<()> {
    if params.rule.is_long_range() {
        return Err(ConfigurationError::UnsupportedRule {
            rule: params.rule.name(),
            model: MODEL,
        }
        .into());
    }
    params.validate()?;
    settings.validate()?;
    params.bounds().check(state.weight)?;
    state.validate()?;
    Ok(())
}

impl EventDrivenUpdater {
    pub fn new(
        params: TripletParameters,
        weight: f64,
        settings: ConnectionSettings,
    ) -> Result<Self> {
        let state = TraceState::with_weight(weight);
        validate(&params, &settings, &state)?;
        Ok(Self {
            params,
            state,
            settings,
        })
    }

    pub fn params(&self) -> &TripletParameters {
        &self.params
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn state(&self) -> &TraceState {
        &self.state
    }

    pub fn weight(&self) -> f64 {
        self.state.weight
    }

    /// Register this connection as a reader of the target's history
    ///
    /// Must be called once before the first [`send`](Self::send) so the
    /// history keeps every spike this connection still has to read.
    pub fn check_connection<H>(&self, history: &H, t_lastspike: f64)
    where
        H: SpikeHistory + ?Sized,
    {
        history.register_connection(t_lastspike - self.settings.delay_ms);
    }

    /// State after processing `spike`, without committing it
    pub fn process<H>(&self, spike: PreSynapticSpike, history: &H) -> Result<TraceState>
    where
        H: SpikeHistory + ?Sized,
    {
        let PreSynapticSpike {
            t_spike,
            t_lastspike,
            ..
        } = spike;
        if t_spike < t_lastspike {
            error!(t_lastspike, t_spike, "Pre-synaptic spikes out of order");
            return Err(InvariantViolation::NegativeElapsed {
                from: t_lastspike,
                to: t_spike,
            }
            .into());
        }

        let delay = self.settings.delay_ms;
        let decay = self.params.decay_model();
        let mut state = self.state;
        let mut t_last_post = t_lastspike;

        for entry in history.history_slice(t_lastspike - delay, t_spike - delay) {
            let t_post = entry.t + delay;
            let elapsed = t_post - t_last_post;
            if elapsed < 0.0 {
                error!(
                    previous = t_last_post,
                    current = t_post,
                    "Post-synaptic history out of order"
                );
                return Err(InvariantViolation::NonMonotonicHistory {
                    previous: t_last_post,
                    current: t_post,
                }
                .into());
            }
            decay.factors(elapsed)?.apply(&mut state);
            rule::on_post_spike(&mut state, &self.params);
            t_last_post = t_post;
        }

        let factors = decay.between(t_last_post, t_spike).map_err(|violation| {
            error!(t_last_post, t_spike, "History slice reached past the spike");
            violation
        })?;
        factors.apply(&mut state);
        rule::on_pre_spike(&mut state, &self.params);
        Ok(state)
    }

    /// Commit a state produced by [`process`](Self::process) and emit the spike
    pub(crate) fn commit<S>(&mut self, state: TraceState, multiplicity: u32, sink: &mut S)
    where
        S: SpikeSink + ?Sized,
    {
        self.state = state;
        sink.emit_spike(self.outgoing(multiplicity));
    }

    pub(crate) fn outgoing(&self, multiplicity: u32) -> OutgoingSpike {
        OutgoingSpike {
            weight: self.state.weight,
            multiplicity,
            lag: 0,
            route: Some(Route {
                delay_ms: self.settings.delay_ms,
                rport: self.settings.rport,
            }),
        }
    }

    /// Process a pre-synaptic spike and emit it with the updated weight
    ///
    /// On error the connection is left untouched and nothing is emitted.
    pub fn send<H, S>(&mut self, spike: PreSynapticSpike, history: &H, sink: &mut S) -> Result<f64>
    where
        H: SpikeHistory + ?Sized,
        S: SpikeSink + ?Sized,
    {
        let state = self.process(spike, history)?;
        trace!(
            t_spike = spike.t_spike,
            weight_before = self.state.weight,
            weight = state.weight,
            "Pre-synaptic spike processed"
        );
        self.commit(state, spike.multiplicity, sink);
        Ok(self.state.weight)
    }

    /// Parameters, state and routing under their canonical keys
    pub fn get_status(&self) -> Status {
        let mut status = Status::new();
        self.params.write_status(&mut status);
        self.state.write_status(&mut status);
        status.insert("delay".into(), self.settings.delay_ms.into());
        status.insert("receptor".into(), f64::from(self.settings.rport).into());
        status
    }

    /// Apply a status update as a whole
    pub fn set_status(&mut self, status: &Status) -> Result<()> {
        let mut params = self.params;
        let mut state = self.state;
        let mut settings = self.settings;

        for (key, value) in status {
            let canonical = canonical_key(key);
            if params.apply(canonical, value)? || state.apply(canonical, value)? {
                continue;
            }
            match canonical {
                "delay" => settings.delay_ms = value.as_f64(canonical)?,
                "receptor" => settings.rport = port_number(canonical, value)?,
                _ => return Err(ConfigurationError::UnknownKey(key.clone()).into()),
            }
        }

        if let Err(err) = validate(&params, &settings, &state) {
            if err.is_fatal() {
                error!(%err, "Rejected connection state");
            }
            return Err(err);
        }
        self.params = params;
        self.state = state;
        self.settings = settings;
        Ok(())
    }
}

fn port_number(key: &str, value: &StatusValue) -> std::result::Result<u32, ConfigurationError> {
    let port = value.as_f64(key)?;
    if port >= 0.0 && port.fract() == 0.0 && port <= f64::from(u32::MAX) {
        // integral and in range
        Ok(port as u32)
    } else {
        Err(ConfigurationError::WrongType {
            key: key.to_string(),
            expected: "non-negative integer",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RulePolicy;
    use crate::status::status_from;

    fn spike(t_lastspike: f64, t_spike: f64) -> PreSynapticSpike {
        PreSynapticSpike {
            t_spike,
            t_lastspike,
            multiplicity: 1,
        }
    }

    #[test]
    fn test_first_spike_without_post_activity() {
        let mut connection = EventDrivenUpdater::default();
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let history: Vec<f64> = Vec::new();
        let weight = connection.send(spike(0.0, 5.0), &history, &mut sink).unwrap();
        assert_eq!(weight, 1.0);
        assert_eq!(connection.state().trace_pre_fast, 1.0);
        assert_eq!(connection.state().trace_pre_slow, 1.0);
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink[0].route,
            Some(Route {
                delay_ms: 1.0,
                rport: 0
            })
        );
    }

    #[test]
    fn test_pre_post_pair_potentiates() {
        let mut connection = EventDrivenUpdater::default();
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        // post spike at 9 ms arrives at the synapse at 10 ms
        let history = vec![9.0];
        connection.send(spike(0.0, 0.0), &history, &mut sink).unwrap();
        connection.send(spike(0.0, 20.0), &history, &mut sink).unwrap();

        let potentiated = 1.0 + 0.1 * (-10.0f64 / 16.8).exp();
        let o1 = (-10.0f64 / 33.7).exp();
        let r2_at_20 = (-20.0f64 / 101.0).exp();
        let expected = potentiated - o1 * (0.1 + 0.1 * r2_at_20);
        assert!((connection.weight() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_order_history_is_fatal() {
        let mut connection = EventDrivenUpdater::default();
        let before = connection;
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let history = vec![8.0, 4.0];
        let err = connection
            .send(spike(0.0, 20.0), &history, &mut sink)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            crate::PlasticityError::Invariant(InvariantViolation::NonMonotonicHistory { .. })
        ));
        assert_eq!(connection, before);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_negative_elapsed_is_fatal() {
        let mut connection = EventDrivenUpdater::default();
        let history: Vec<f64> = Vec::new();
        let err = connection
            .send(spike(10.0, 5.0), &history, &mut Vec::<OutgoingSpike>::new())
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_coincident_post_spikes_skip_decay() {
        let mut connection = EventDrivenUpdater::default();
        let mut sink: Vec<OutgoingSpike> = Vec::new();
        let none: Vec<f64> = Vec::new();
        connection.send(spike(0.0, 0.0), &none, &mut sink).unwrap();
        // two post spikes recorded at the same time
        let history = vec![4.0, 4.0];
        connection.send(spike(0.0, 5.0), &history, &mut sink).unwrap();
        let state = connection.state();
        // both increments land at 5 ms and nothing decays afterwards
        assert_eq!(state.trace_post_fast, 2.0);
        assert_eq!(state.trace_post_slow, 2.0);

        let r1 = (-5.0f64 / 16.8).exp();
        let r2 = (-5.0f64 / 101.0).exp();
        let expected = 1.0 + 0.1 * r1 + 0.2 * r1 - 2.0 * (0.1 + 0.1 * r2);
        assert!((state.weight - expected).abs() < 1e-12);
    }

    #[test]
    fn test_construction_validates() {
        let params = TripletParameters {
            w_min: 1.0,
            w_max: 0.0,
            ..Default::default()
        };
        assert!(EventDrivenUpdater::new(params, 0.5, ConnectionSettings::default()).is_err());

        let params = TripletParameters {
            rule: RulePolicy::LongRangeHomeostatic,
            ..Default::default()
        };
        assert!(EventDrivenUpdater::new(params, 0.5, ConnectionSettings::default()).is_err());

        let settings = ConnectionSettings {
            delay_ms: 0.0,
            rport: 0,
        };
        assert!(EventDrivenUpdater::new(TripletParameters::default(), 0.5, settings).is_err());

        let out_of_bounds =
            EventDrivenUpdater::new(TripletParameters::default(), 200.0, ConnectionSettings::default());
        assert!(out_of_bounds.is_err());
    }

    #[test]
    fn test_status_aliases_and_routing() {
        let mut connection = EventDrivenUpdater::default();
        let status = status_from([
            ("Aplus", StatusValue::Double(0.2)),
            ("delay", StatusValue::Double(2.5)),
            ("receptor", StatusValue::Double(3.0)),
        ]);
        connection.set_status(&status).unwrap();
        assert_eq!(connection.params().a_plus, 0.2);
        assert_eq!(connection.settings().delay_ms, 2.5);
        assert_eq!(connection.settings().rport, 3);

        let read = connection.get_status();
        assert_eq!(read["A_plus"], StatusValue::Double(0.2));
        assert_eq!(read["delay"], StatusValue::Double(2.5));

        let bad = status_from([("receptor", StatusValue::Double(1.5))]);
        assert!(connection.set_status(&bad).is_err());
        let bad = status_from([("Zht", StatusValue::Double(1.0))]);
        assert!(connection.set_status(&bad).is_err());
    }
}
