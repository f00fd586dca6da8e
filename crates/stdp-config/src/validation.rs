// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem instead of stopping at the first, so a broken file
//! can be fixed in one pass.

use stdp_plasticity::ConfigurationError;

use crate::{ConfigError, ConfigResult, StdpConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
    Parameter {
        section: &'static str,
        error: ConfigurationError,
    },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::Parameter { section, error } => write!(f, "[{}] {}", section, error),
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Positive resolution and a consistent delay range
/// - Rule parameter consistency, as the plasticity crate defines it
/// - Connection routing
/// - Known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &StdpConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_parameters(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_simulation(config: &StdpConfig, errors: &mut Vec<ConfigValidationError>) {
    let simulation = &config.simulation;
    if !(simulation.resolution_ms > 0.0) || !simulation.resolution_ms.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.resolution_ms".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if simulation.min_delay_steps < 1 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.min_delay_steps".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if simulation.max_delay_steps < simulation.min_delay_steps {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.max_delay_steps".to_string(),
            reason: "must not be below min_delay_steps".to_string(),
        });
    }
}

fn validate_parameters(config: &StdpConfig, errors: &mut Vec<ConfigValidationError>) {
    errors.extend(
        config
            .triplet
            .validation_errors()
            .into_iter()
            .map(|error| ConfigValidationError::Parameter {
                section: "triplet",
                error,
            }),
    );
    if config.triplet.rule.is_long_range() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "triplet.rule".to_string(),
            reason: "long_range_homeostatic is configured in [long_range]".to_string(),
        });
    }

    errors.extend(
        config
            .long_range
            .validation_errors()
            .into_iter()
            .map(|error| ConfigValidationError::Parameter {
                section: "long_range",
                error,
            }),
    );

    if let Err(error) = config.connection.validate() {
        errors.push(ConfigValidationError::Parameter {
            section: "connection",
            error,
        });
    }
}

fn validate_logging(config: &StdpConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stdp_plasticity::RulePolicy;

    #[test]
    fn test_default_config_is_valid() {
        let config = StdpConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_resolution() {
        let mut config = StdpConfig::default();
        config.simulation.resolution_ms = 0.0;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("simulation.resolution_ms"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_errors_are_aggregated() {
        let mut config = StdpConfig::default();
        config.triplet.tau_plus_triplet = 10.0;
        config.triplet.w_min = 5.0;
        config.triplet.w_max = 1.0;
        config.simulation.max_delay_steps = 0;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("tau_plus_triplet"));
            assert!(msg.contains("Wmin"));
            assert!(msg.contains("max_delay_steps"));
            assert_eq!(msg.lines().count(), 4);
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_long_range_rule_not_in_triplet_section() {
        let mut config = StdpConfig::default();
        config.triplet.rule = RulePolicy::LongRangeHomeostatic;

        let result = validate_config(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_long_range_needs_slow_trace_slower() {
        let mut config = StdpConfig::default();
        config.long_range.tau_slow = 10.0;

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("[long_range]"));
            assert!(msg.contains("tau_slow"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = StdpConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
