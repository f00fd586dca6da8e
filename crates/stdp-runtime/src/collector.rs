// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routing sink that keeps every emitted spike

use serde::{Deserialize, Serialize};
use stdp_plasticity::{OutgoingSpike, SpikeSink};

/// Emitted spike with its absolute step (clock-driven units only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampedSpike {
    pub step: i64,
    #[serde(flatten)]
    pub spike: OutgoingSpike,
}

/// Collects spikes emitted while one window is being processed
///
/// The origin of the current window turns each spike's lag into an absolute step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpikeCollector {
    origin: i64,
    spikes: Vec<StampedSpike>,
}

impl SpikeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origin of the window about to be processed
    pub fn set_origin(&mut self, origin: i64) {
        self.origin = origin;
    }

    pub fn spikes(&self) -> &[StampedSpike] {
        &self.spikes
    }

    /// Weights carried by the collected spikes, in emission order
    pub fn weights(&self) -> Vec<f64> {
        self.spikes.iter().map(|stamped| stamped.spike.weight).collect()
    }

    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    /// Hand over everything collected so far
    pub fn drain(&mut self) -> Vec<StampedSpike> {
        std::mem::take(&mut self.spikes)
    }
}

impl SpikeSink for SpikeCollector {
    fn emit_spike(&mut self, spike: OutgoingSpike) {
        self.spikes.push(StampedSpike {
            step: self.origin + spike.lag,
            spike,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_becomes_absolute_step() {
        let mut collector = SpikeCollector::new();
        collector.set_origin(40);
        collector.emit_spike(OutgoingSpike {
            weight: 0.5,
            multiplicity: 1,
            lag: 3,
            route: None,
        });
        assert_eq!(collector.spikes()[0].step, 43);
        assert_eq!(collector.weights(), vec![0.5]);
        assert_eq!(collector.drain().len(), 1);
        assert!(collector.is_empty());
    }
}
