// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model registry
//!
//! Maps model names to constructors. The host builds one registry at start-up
//! and passes it to whatever creates connections and units.

use ahash::AHashMap;
use tracing::debug;

use crate::clock_driven::ClockDrivenUpdater;
use crate::error::{ConfigurationError, Result};
use crate::event_driven::EventDrivenUpdater;
use crate::params::{LongRangeParameters, TripletParameters};
use crate::status::Status;

/// Anything a registered constructor can produce
#[derive(Debug, Clone, PartialEq)]
pub enum PlasticityModel {
    /// Event-driven connection
    Connection(EventDrivenUpdater),
    /// Clock-driven unit
    Unit(ClockDrivenUpdater),
}

impl PlasticityModel {
    pub fn get_status(&self) -> Status {
        match self {
            PlasticityModel::Connection(connection) => connection.get_status(),
            PlasticityModel::Unit(unit) => unit.get_status(),
        }
    }

    pub fn set_status(&mut self, status: &Status) -> Result<()> {
        match self {
            PlasticityModel::Connection(connection) => connection.set_status(status),
            PlasticityModel::Unit(unit) => unit.set_status(status),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            PlasticityModel::Connection(connection) => connection.weight(),
            PlasticityModel::Unit(unit) => unit.weight(),
        }
    }
}

/// Build a model from its initial status (defaults for missing keys)
pub type ModelConstructor = fn(&Status) -> Result<PlasticityModel>;

fn triplet_synapse(status: &Status) -> Result<PlasticityModel> {
    let mut connection = EventDrivenUpdater::default();
    connection.set_status(status)?;
    Ok(PlasticityModel::Connection(connection))
}

fn triplet_neuron(status: &Status) -> Result<PlasticityModel> {
    let mut unit = ClockDrivenUpdater::new_triplet(TripletParameters::default(), 1.0)?;
    unit.set_status(status)?;
    Ok(PlasticityModel::Unit(unit))
}

fn long_neuron(status: &Status) -> Result<PlasticityModel> {
    let mut unit = ClockDrivenUpdater::new_long_range(LongRangeParameters::default(), 1.0)?;
    unit.set_status(status)?;
    Ok(PlasticityModel::Unit(unit))
}

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    constructors: AHashMap<String, ModelConstructor>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `stdp_triplet_synapse`, `stdp_triplet_neuron` and `stdp_long_neuron`
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, ModelConstructor); 3] = [
            ("stdp_triplet_synapse", triplet_synapse),
            ("stdp_triplet_neuron", triplet_neuron),
            ("stdp_long_neuron", long_neuron),
        ];
        for (name, constructor) in builtins {
            registry
                .constructors
                .insert(name.to_string(), constructor);
        }
        debug!(models = registry.len(), "Registered built-in plasticity models");
        registry
    }

    pub fn register(&mut self, name: &str, constructor: ModelConstructor) -> Result<()> {
        if self.constructors.contains_key(name) {
            return Err(ConfigurationError::DuplicateModel(name.to_string()).into());
        }
        self.constructors.insert(name.to_string(), constructor);
        debug!(model = name, "Registered plasticity model");
        Ok(())
    }

    pub fn create(&self, name: &str, status: &Status) -> Result<PlasticityModel> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownModel(name.to_string()))?;
        let model = constructor(status)?;
        debug!(model = name, weight = model.weight(), "Created plasticity model");
        Ok(model)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RulePolicy;
    use crate::status::{status_from, StatusValue};

    #[test]
    fn test_builtin_models() {
        let registry = ModelRegistry::with_builtin_models();
        assert_eq!(
            registry.names(),
            vec!["stdp_long_neuron", "stdp_triplet_neuron", "stdp_triplet_synapse"]
        );

        let status = status_from([("weight", StatusValue::Double(0.4))]);
        match registry.create("stdp_triplet_synapse", &status).unwrap() {
            PlasticityModel::Connection(connection) => assert_eq!(connection.weight(), 0.4),
            other => panic!("unexpected model {other:?}"),
        }
        match registry.create("stdp_long_neuron", &Status::new()).unwrap() {
            PlasticityModel::Unit(unit) => {
                assert_eq!(unit.policy(), RulePolicy::LongRangeHomeostatic)
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        let mut registry = ModelRegistry::with_builtin_models();
        assert_eq!(
            registry.create("iaf_psc_alpha", &Status::new()),
            Err(ConfigurationError::UnknownModel("iaf_psc_alpha".into()).into())
        );
        assert!(registry
            .register("stdp_triplet_neuron", triplet_neuron)
            .is_err());
        assert!(registry.register("stdp_pair_neuron", triplet_neuron).is_ok());
        assert!(registry.contains("stdp_pair_neuron"));
    }

    #[test]
    fn test_constructor_status_is_validated() {
        let registry = ModelRegistry::with_builtin_models();
        let status = status_from([("tau_plus", StatusValue::Double(500.0))]);
        assert!(registry.create("stdp_triplet_neuron", &status).is_err());
    }
}
