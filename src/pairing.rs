// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pairing protocol of Pfister & Gerstner (2006)
//!
//! `pairs` pre/post spike pairs are repeated at frequency `rho_hz`; within a
//! pair the post-synaptic spike follows the pre-synaptic one by `delta_ms`
//! (negative: post before pre). The protocol drives a clock-driven triplet
//! unit through the slice scheduler and reports the total weight change.

use serde::{Deserialize, Serialize};
use stdp_plasticity::{ClockDrivenUpdater, NullLogger, PlasticityError, ReceptorPort, TripletParameters};
use stdp_runtime::{FixedClock, SliceScheduler, SpikeCollector};
use thiserror::Error;
use tracing::debug;

/// Lead-in before the first spike of the protocol (ms)
const LEAD_IN_MS: f64 = 10.0;

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Pairing frequency must be positive (got {0} Hz)")]
    InvalidFrequency(f64),

    #[error("Pairing protocol needs at least one pair")]
    NoPairs,

    #[error(transparent)]
    Plasticity(#[from] PlasticityError),
}

/// Trace accumulation used for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingVariant {
    AllToAll,
    NearestSpike,
}

impl PairingVariant {
    pub const ALL: [PairingVariant; 2] = [PairingVariant::AllToAll, PairingVariant::NearestSpike];

    /// `params` with the nearest-spike flag set for this variant
    ///
    /// A `triplet_nearest_spike` rule stays nearest-spike in both variants.
    pub fn apply(self, params: TripletParameters) -> TripletParameters {
        TripletParameters {
            nearest_spike_only: self == PairingVariant::NearestSpike,
            ..params
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairingProtocol {
    pub rho_hz: f64,
    pub pairs: usize,
    /// Post-synaptic spike time relative to the pre-synaptic one (ms)
    pub delta_ms: f64,
    pub initial_weight: f64,
}

impl Default for PairingProtocol {
    fn default() -> Self {
        Self {
            rho_hz: 1.0,
            pairs: 60,
            delta_ms: 10.0,
            initial_weight: 1.0,
        }
    }
}

/// Weight change of one protocol run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairingResult {
    pub rho_hz: f64,
    pub delta_ms: f64,
    pub pairs: usize,
    pub variant: PairingVariant,
    pub weight_change: f64,
}

impl PairingProtocol {
    fn validate(&self) -> Result<(), PairingError> {
        if !(self.rho_hz > 0.0) || !self.rho_hz.is_finite() {
            return Err(PairingError::InvalidFrequency(self.rho_hz));
        }
        if self.pairs == 0 {
            return Err(PairingError::NoPairs);
        }
        Ok(())
    }

    /// Pre- and post-synaptic spike times (ms), in pair order
    pub fn spike_times(&self) -> (Vec<f64>, Vec<f64>) {
        let period_ms = 1000.0 / self.rho_hz;
        let start = self.delta_ms.abs() + LEAD_IN_MS;
        (0..self.pairs)
            .map(|k| {
                let t_pre = start + k as f64 * period_ms;
                (t_pre, t_pre + self.delta_ms)
            })
            .unzip()
    }

    /// Total weight change after the last spike of the protocol
    pub fn run(&self, params: TripletParameters, clock: FixedClock) -> Result<f64, PairingError> {
        self.validate()?;
        let mut unit = ClockDrivenUpdater::new_triplet(params, self.initial_weight)?;
        let mut scheduler = SliceScheduler::new(clock);
        scheduler.prepare(&mut unit)?;

        let (pre, post) = self.spike_times();
        let mut last_step = 0;
        for (times, port) in [(&pre, ReceptorPort::Pre), (&post, ReceptorPort::Post)] {
            for &t in times {
                scheduler.schedule_at_ms(port, t)?;
                last_step = last_step.max(clock.ms_to_step(t));
            }
        }

        let mut collector = SpikeCollector::new();
        scheduler.run_until(last_step + 1, &mut unit, &mut collector, &mut NullLogger)?;

        let weight_change = unit.weight() - self.initial_weight;
        debug!(
            rho_hz = self.rho_hz,
            delta_ms = self.delta_ms,
            nearest = params.nearest_spike(),
            weight_change,
            "Pairing protocol finished"
        );
        Ok(weight_change)
    }
}

/// Run the protocol at every frequency, for `+delta_ms` and `-delta_ms`, in both variants
pub fn frequency_sweep(
    params: TripletParameters,
    clock: FixedClock,
    frequencies: &[f64],
    template: PairingProtocol,
) -> Result<Vec<PairingResult>, PairingError> {
    let delta = template.delta_ms.abs();
    let mut results = Vec::with_capacity(frequencies.len() * 4);
    for &rho_hz in frequencies {
        for delta_ms in [delta, -delta] {
            let protocol = PairingProtocol {
                rho_hz,
                delta_ms,
                ..template
            };
            for variant in PairingVariant::ALL {
                let weight_change = protocol.run(variant.apply(params), clock)?;
                results.push(PairingResult {
                    rho_hz,
                    delta_ms,
                    pairs: protocol.pairs,
                    variant,
                    weight_change,
                });
            }
        }
    }
    Ok(results)
}
