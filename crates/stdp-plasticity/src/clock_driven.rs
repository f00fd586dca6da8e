// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Clock-driven plasticity unit
//!
//! A stand-alone unit placed between the pre-synaptic source and the target.
//! Pre-synaptic spikes arrive on port 0 and are repeated downstream carrying
//! the current weight; post-synaptic spikes are fed back on port 1. Traces are
//! advanced on every simulation step.
//!
//! ## Per-step order
//!
//! 1. decay every trace by the precomputed step factors
//! 2. long-range only: integrate `weight_ref` and `C`
//! 3. pre-synaptic spikes in this step: depress, increment, emit
//! 4. post-synaptic spikes in this step: potentiate, increment
//! 5. hand the state to the data logger
//!
//! Trace increments are `+1` per step with spikes, whatever the multiplicity;
//! the multiplicity travels on the emitted spike.
//!
//! ## Delivery horizon
//!
//! Spikes are buffered per step in rings of `min_delay + max_delay` slots
//! sized by [`ClockDrivenUpdater::calibrate`]. A spike is accepted only for a
//! step in `[next_step, next_step + capacity)`, and windows must continue at
//! `next_step`, so no two pending steps ever share a slot.

use tracing::{debug, error, trace, warn};

use crate::bounded::BoundedWeight;
use crate::decay::{DecayFactors, DecayModel};
use crate::error::{ConfigurationError, InvariantViolation, Result};
use crate::host::{
    DataLogger, IncomingSpike, OutgoingSpike, ReceptorPort, SimulationClock, SpikeSink,
    UpdateWindow,
};
use crate::params::{LongRangeParameters, TripletParameters};
use crate::recordables::Recordable;
use crate::ring_buffer::RingBuffer;
use crate::rule::{self, RulePolicy};
use crate::status::{canonical_key, Status, StatusValue};
use crate::trace::TraceState;

const TRIPLET_MODEL: &str = "stdp_triplet_neuron";
const LONG_RANGE_MODEL: &str = "stdp_long_neuron";

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnitRule {
    Triplet(TripletParameters),
    LongRange(LongRangeParameters),
}

impl UnitRule {
    fn model_name(&self) -> &'static str {
        match self {
            UnitRule::Triplet(_) => TRIPLET_MODEL,
            UnitRule::LongRange(_) => LONG_RANGE_MODEL,
        }
    }

    fn policy(&self) -> RulePolicy {
        match self {
            UnitRule::Triplet(params) => params.rule,
            UnitRule::LongRange(_) => RulePolicy::LongRangeHomeostatic,
        }
    }

    fn decay_model(&self) -> DecayModel {
        match self {
            UnitRule::Triplet(params) => params.decay_model(),
            UnitRule::LongRange(params) => params.decay_model(),
        }
    }

    fn bounds(&self) -> BoundedWeight {
        match self {
            UnitRule::Triplet(params) => params.bounds(),
            UnitRule::LongRange(params) => params.bounds(),
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        match self {
            UnitRule::Triplet(params) => {
                if params.rule.is_long_range() {
                    return Err(ConfigurationError::UnsupportedRule {
                        rule: params.rule.name(),
                        model: TRIPLET_MODEL,
                    });
                }
                params.validate()
            }
            UnitRule::LongRange(params) => params.validate(),
        }
    }

    fn apply(
        &mut self,
        key: &str,
        value: &StatusValue,
    ) -> std::result::Result<bool, ConfigurationError> {
        match self {
            UnitRule::Triplet(params) => params.apply(key, value),
            UnitRule::LongRange(params) => params.apply(key, value),
        }
    }

    fn recordables(&self) -> &'static [Recordable] {
        match self {
            UnitRule::Triplet(_) => &Recordable::TRIPLET,
            UnitRule::LongRange(_) => &Recordable::LONG_RANGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Calibration {
    resolution_ms: f64,
    min_delay: i64,
    factors: DecayFactors,
}

/// Trace state advanced once per simulation step
#[derive(Debug, Clone, PartialEq)]
pub struct ClockDrivenUpdater {
    rule: UnitRule,
    state: TraceState,
    pre_spikes: RingBuffer,
    post_spikes: RingBuffer,
    calibration: Option<Calibration>,
    /// First step not yet simulated
    next_step: i64,
}

impl ClockDrivenUpdater {
    /// Triplet-family unit (`PairBased`, `Triplet` or `TripletNearestSpike`)
    pub fn new_triplet(params: TripletParameters, weight: f64) -> Result<Self> {
        Self::with_rule(UnitRule::Triplet(params), TraceState::with_weight(weight))
    }

    /// Long-range homeostatic unit
    pub fn new_long_range(params: LongRangeParameters, weight: f64) -> Result<Self> {
        Self::with_rule(UnitRule::LongRange(params), TraceState::long_range(weight))
    }

    fn with_rule(rule: UnitRule, state: TraceState) -> Result<Self> {
        rule.validate()?;
        rule.bounds().check(state.weight)?;
        Ok(Self {
            rule,
            state,
            // sized by calibrate
            pre_spikes: RingBuffer::new(1)?,
            post_spikes: RingBuffer::new(1)?,
            calibration: None,
            next_step: 0,
        })
    }

    pub fn model_name(&self) -> &'static str {
        self.rule.model_name()
    }

    pub fn policy(&self) -> RulePolicy {
        self.rule.policy()
    }

    pub fn state(&self) -> &TraceState {
        &self.state
    }

    pub fn weight(&self) -> f64 {
        self.state.weight
    }

    pub fn triplet_parameters(&self) -> Option<&TripletParameters> {
        match &self.rule {
            UnitRule::Triplet(params) => Some(params),
            UnitRule::LongRange(_) => None,
        }
    }

    pub fn long_range_parameters(&self) -> Option<&LongRangeParameters> {
        match &self.rule {
            UnitRule::LongRange(params) => Some(params),
            UnitRule::Triplet(_) => None,
        }
    }

    pub fn recordables(&self) -> &'static [Recordable] {
        self.rule.recordables()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// First step the next update window must start at
    pub fn next_step(&self) -> i64 {
        self.next_step
    }

    /// Steps `[first, end)` for which spikes are currently accepted
    pub fn delivery_horizon(&self) -> (i64, i64) {
        let capacity = self.pre_spikes.capacity() as i64;
        (self.next_step, self.next_step + capacity)
    }

    /// Precompute step decay factors and size the spike buffers for `clock`
    ///
    /// Called once before the first update and again whenever the clock
    /// changes. Pending spikes move to the resized buffers; if one falls
    /// outside the new horizon nothing changes and the call fails.
    pub fn calibrate<C: SimulationClock + ?Sized>(&mut self, clock: &C) -> Result<()> {
        let resolution_ms = clock.resolution_ms();
        let factors = self.rule.decay_model().step_factors(resolution_ms)?;

        let min_delay = clock.min_delay_steps();
        if min_delay < 1 {
            return Err(ConfigurationError::InvalidMinDelay(min_delay).into());
        }
        let max_delay = clock.max_delay_steps().max(min_delay);
        let capacity = usize::try_from(min_delay + max_delay)
            .map_err(|_| ConfigurationError::InvalidMinDelay(min_delay))?;
        if capacity != self.pre_spikes.capacity() {
            let pre_spikes = rebuffer(&self.pre_spikes, self.next_step, capacity)?;
            let post_spikes = rebuffer(&self.post_spikes, self.next_step, capacity)?;
            self.pre_spikes = pre_spikes;
            self.post_spikes = post_spikes;
        }

        self.calibration = Some(Calibration {
            resolution_ms,
            min_delay,
            factors,
        });
        debug!(
            model = self.model_name(),
            resolution_ms,
            min_delay,
            buffer_steps = capacity,
            "Calibrated clock-driven plasticity unit"
        );
        Ok(())
    }

    /// Drop all pending spike counts
    pub fn init_buffers(&mut self) {
        self.pre_spikes.clear();
        self.post_spikes.clear();
    }

    /// Check that `port` can be connected to this unit
    pub fn check_receptor(&self, port: u32) -> Result<ReceptorPort> {
        Ok(ReceptorPort::from_port(port, self.model_name())?)
    }

    /// Queue an incoming spike for its delivery step
    ///
    /// The unit must be calibrated and the step must lie inside the delivery
    /// horizon.
    pub fn handle(&mut self, spike: IncomingSpike) -> Result<()> {
        let port = self.check_receptor(spike.port)?;
        if self.calibration.is_none() {
            error!(model = self.model_name(), "Spike handed to an uncalibrated unit");
            return Err(InvariantViolation::NotCalibrated.into());
        }
        let (first, end) = self.delivery_horizon();
        if spike.delivery_step < first || spike.delivery_step >= end {
            error!(
                step = spike.delivery_step,
                first, end, "Spike outside the delivery horizon"
            );
            return Err(InvariantViolation::DeliveryOutsideHorizon {
                step: spike.delivery_step,
                first,
                end,
            }
            .into());
        }
        if spike.multiplicity == 0 {
            warn!(
                port = spike.port,
                step = spike.delivery_step,
                "Ignoring spike with zero multiplicity"
            );
            return Ok(());
        }
        let buffer = match port {
            ReceptorPort::Pre => &mut self.pre_spikes,
            ReceptorPort::Post => &mut self.post_spikes,
        };
        buffer.add_value(spike.delivery_step, f64::from(spike.multiplicity));
        Ok(())
    }

    /// Advance the unit through every step of `window`
    ///
    /// The window and calibration are checked before any state changes.
    pub fn update<S, L>(&mut self, window: UpdateWindow, sink: &mut S, logger: &mut L) -> Result<()>
    where
        S: SpikeSink + ?Sized,
        L: DataLogger + ?Sized,
    {
        if let Err(violation) = window.validate() {
            error!(?window, "Rejected update window");
            return Err(violation.into());
        }
        let Some(calibration) = self.calibration else {
            error!(model = self.model_name(), "Update before calibration");
            return Err(InvariantViolation::NotCalibrated.into());
        };
        if window.to > calibration.min_delay {
            error!(?window, calibrated = calibration.min_delay, "Window longer than min_delay");
            return Err(InvariantViolation::InvalidStepWindow {
                from: window.from,
                to: window.to,
                min_delay: calibration.min_delay,
            }
            .into());
        }
        let start = window.origin + window.from;
        let skips_pending = start > self.next_step
            && !(self.pre_spikes.is_clear() && self.post_spikes.is_clear());
        if start < self.next_step || skips_pending {
            error!(start, expected = self.next_step, "Update window out of order");
            return Err(InvariantViolation::StepOutOfOrder {
                start,
                expected: self.next_step,
            }
            .into());
        }

        for (lag, step) in window.steps() {
            calibration.factors.apply(&mut self.state);

            let n_pre = self.pre_spikes.get_value(step);
            let n_post = self.post_spikes.get_value(step);

            match &self.rule {
                UnitRule::Triplet(params) => {
                    if n_pre > 0.0 {
                        rule::on_pre_spike(&mut self.state, params);
                        sink.emit_spike(outgoing(self.state.weight, n_pre, lag));
                    }
                    if n_post > 0.0 {
                        rule::on_post_spike(&mut self.state, params);
                    }
                }
                UnitRule::LongRange(params) => {
                    rule::long_range_homeostasis(&mut self.state, params, calibration.resolution_ms);
                    if n_pre > 0.0 {
                        rule::on_pre_spike_long_range(&mut self.state, params);
                        sink.emit_spike(outgoing(self.state.weight, n_pre, lag));
                    }
                    if n_post > 0.0 {
                        rule::on_post_spike_long_range(&mut self.state, params);
                    }
                }
            }

            if n_pre > 0.0 || n_post > 0.0 {
                trace!(step, n_pre, n_post, weight = self.state.weight, "Plasticity step");
            }
            logger.record_data(step, &self.state);
        }
        self.next_step = window.origin + window.to;
        Ok(())
    }

    /// Parameters, state and recordables under their canonical keys
    pub fn get_status(&self) -> Status {
        let mut status = Status::new();
        match &self.rule {
            UnitRule::Triplet(params) => params.write_status(&mut status),
            UnitRule::LongRange(params) => params.write_status(&mut status),
        }
        self.state.write_status(&mut status);
        let names: Vec<&str> = self.recordables().iter().map(|r| r.name()).collect();
        status.insert("recordables".into(), names.join(",").into());
        status
    }

    /// Apply a status update as a whole
    ///
    /// Aliases are accepted. Nothing changes unless every entry is recognised
    /// and the resulting parameters and state are valid.
    pub fn set_status(&mut self, status: &Status) -> Result<()> {
        let mut rule = self.rule;
        let mut state = self.state;

        for (key, value) in status {
            let canonical = canonical_key(key);
            if rule.apply(canonical, value)? {
                continue;
            }
            if !state.apply(canonical, value)? && canonical != "recordables" {
                return Err(ConfigurationError::UnknownKey(key.clone()).into());
            }
        }

        rule.validate()?;
        rule.bounds().check(state.weight)?;
        if let Err(violation) = state.validate() {
            error!(model = self.model_name(), %violation, "Rejected state update");
            return Err(violation.into());
        }
        let calibration = match self.calibration {
            Some(c) => Some(Calibration {
                factors: rule.decay_model().step_factors(c.resolution_ms)?,
                ..c
            }),
            None => None,
        };

        self.rule = rule;
        self.state = state;
        self.calibration = calibration;
        Ok(())
    }
}

/// Copy the counts pending from `next_step` on into a buffer of `capacity` slots
fn rebuffer(old: &RingBuffer, next_step: i64, capacity: usize) -> Result<RingBuffer> {
    let mut resized = RingBuffer::new(capacity)?;
    let end = next_step + capacity as i64;
    for step in next_step..next_step + old.capacity() as i64 {
        let count = old.value(step);
        if count == 0.0 {
            continue;
        }
        if step >= end {
            return Err(InvariantViolation::DeliveryOutsideHorizon {
                step,
                first: next_step,
                end,
            }
            .into());
        }
        resized.add_value(step, count);
    }
    Ok(resized)
}

fn outgoing(weight: f64, count: f64, lag: i64) -> OutgoingSpike {
    OutgoingSpike {
        weight,
        // counts are sums of u32 multiplicities
        multiplicity: count as u32,
        lag,
        route: None,
    }
}
