// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Slice scheduler for clock-driven units
//!
//! Advances time in blocks of at most `min_delay` steps. Before each block,
//! every queued spike due inside it is handed to the unit, which is then
//! updated over the whole block. Spikes due later stay queued, so the unit's
//! ring buffers never hold more than one block ahead.

use std::collections::VecDeque;

use stdp_plasticity::{
    ClockDrivenUpdater, DataLogger, IncomingSpike, InvariantViolation, ReceptorPort, Result,
    SimulationClock, UpdateWindow,
};
use tracing::{debug, trace};

use crate::clock::FixedClock;
use crate::collector::SpikeCollector;

#[derive(Debug, Clone, PartialEq)]
pub struct SliceScheduler {
    clock: FixedClock,
    origin: i64,
    pending: VecDeque<IncomingSpike>,
}

impl SliceScheduler {
    pub fn new(clock: FixedClock) -> Self {
        Self {
            clock,
            origin: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    /// First step not yet simulated
    pub fn current_step(&self) -> i64 {
        self.origin
    }

    pub fn current_time_ms(&self) -> f64 {
        self.clock.step_to_ms(self.origin)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Calibrate `unit` against this scheduler's clock
    pub fn prepare(&self, unit: &mut ClockDrivenUpdater) -> Result<()> {
        unit.calibrate(&self.clock)
    }

    /// Queue a spike; steps already simulated are rejected
    pub fn schedule(&mut self, spike: IncomingSpike) -> Result<()> {
        if spike.delivery_step < self.origin {
            return Err(InvariantViolation::NegativeElapsed {
                from: self.current_time_ms(),
                to: self.clock.step_to_ms(spike.delivery_step),
            }
            .into());
        }
        let index = self
            .pending
            .partition_point(|queued| queued.delivery_step <= spike.delivery_step);
        self.pending.insert(index, spike);
        Ok(())
    }

    /// Queue a single spike arriving on `port` at `t_ms`
    pub fn schedule_at_ms(&mut self, port: ReceptorPort, t_ms: f64) -> Result<()> {
        self.schedule(IncomingSpike {
            port: port as u32,
            delivery_step: self.clock.ms_to_step(t_ms),
            multiplicity: 1,
        })
    }

    /// Simulate up to (not including) `end_step`
    pub fn run_until<L>(
        &mut self,
        end_step: i64,
        unit: &mut ClockDrivenUpdater,
        collector: &mut SpikeCollector,
        logger: &mut L,
    ) -> Result<()>
    where
        L: DataLogger + ?Sized,
    {
        let min_delay = self.clock.min_delay_steps();
        let start = self.origin;
        while self.origin < end_step {
            let to = min_delay.min(end_step - self.origin);
            let block_end = self.origin + to;
            while self
                .pending
                .front()
                .is_some_and(|spike| spike.delivery_step < block_end)
            {
                if let Some(spike) = self.pending.pop_front() {
                    unit.handle(spike)?;
                }
            }

            collector.set_origin(self.origin);
            let window = UpdateWindow {
                origin: self.origin,
                from: 0,
                to,
                min_delay,
            };
            unit.update(window, collector, logger)?;
            trace!(origin = self.origin, steps = to, "Dispatched slice");
            self.origin = block_end;
        }
        debug!(
            from_step = start,
            to_step = self.origin,
            pending = self.pending.len(),
            "Simulation advanced"
        );
        Ok(())
    }

    /// Simulate `duration_ms` from the current step
    pub fn run_for_ms<L>(
        &mut self,
        duration_ms: f64,
        unit: &mut ClockDrivenUpdater,
        collector: &mut SpikeCollector,
        logger: &mut L,
    ) -> Result<()>
    where
        L: DataLogger + ?Sized,
    {
        let end_step = self.origin + self.clock.ms_to_step(duration_ms);
        self.run_until(end_step, unit, collector, logger)
    }
}
