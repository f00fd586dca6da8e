// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory data logger
//!
//! Samples a fixed list of recordables every `interval_steps` steps. The list
//! is checked against the unit's own recordables when the multimeter is built.

use serde::{Deserialize, Serialize};
use stdp_plasticity::{ClockDrivenUpdater, ConfigurationError, DataLogger, Recordable, TraceState};

/// Values of the selected recordables at one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub step: i64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Multimeter {
    recordables: Vec<Recordable>,
    interval_steps: i64,
    samples: Vec<Sample>,
}

impl Multimeter {
    /// Record `names` (canonical or alias) of `unit` every `interval_steps` steps
    pub fn for_unit(
        unit: &ClockDrivenUpdater,
        names: &[&str],
        interval_steps: i64,
    ) -> Result<Self, ConfigurationError> {
        let available = unit.recordables();
        let recordables = names
            .iter()
            .map(|name| {
                let recordable = Recordable::from_name(name)?;
                if available.contains(&recordable) {
                    Ok(recordable)
                } else {
                    Err(ConfigurationError::UnknownKey((*name).to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            recordables,
            interval_steps: interval_steps.max(1),
            samples: Vec::new(),
        })
    }

    pub fn recordables(&self) -> &[Recordable] {
        &self.recordables
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Series of one recordable across all samples
    pub fn series(&self, recordable: Recordable) -> Option<Vec<f64>> {
        let column = self.recordables.iter().position(|&r| r == recordable)?;
        Some(self.samples.iter().map(|s| s.values[column]).collect())
    }
}

impl DataLogger for Multimeter {
    fn record_data(&mut self, step: i64, state: &TraceState) {
        if step.rem_euclid(self.interval_steps) != 0 {
            return;
        }
        let values = self
            .recordables
            .iter()
            .map(|r| r.value(state).unwrap_or(f64::NAN))
            .collect();
        self.samples.push(Sample { step, values });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stdp_plasticity::{LongRangeParameters, TripletParameters};

    #[test]
    fn test_rejects_recordables_of_other_models() {
        let unit = ClockDrivenUpdater::new_triplet(TripletParameters::default(), 1.0).unwrap();
        assert!(Multimeter::for_unit(&unit, &["weight", "Kplus"], 1).is_ok());
        assert!(Multimeter::for_unit(&unit, &["Zht"], 1).is_err());

        let long = ClockDrivenUpdater::new_long_range(LongRangeParameters::default(), 1.0).unwrap();
        assert!(Multimeter::for_unit(&long, &["Zht", "C", "weight_ref"], 1).is_ok());
    }

    #[test]
    fn test_interval() {
        let unit = ClockDrivenUpdater::new_triplet(TripletParameters::default(), 1.0).unwrap();
        let mut meter = Multimeter::for_unit(&unit, &["weight"], 5).unwrap();
        for step in 0..12 {
            meter.record_data(step, unit.state());
        }
        let steps: Vec<i64> = meter.samples().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 5, 10]);
        assert_eq!(meter.series(Recordable::Weight), Some(vec![1.0; 3]));
        assert_eq!(meter.series(Recordable::C), None);
    }
}
