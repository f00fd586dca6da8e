// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use stdp_plasticity::{canonical_key, StatusValue};

use crate::{ConfigError, ConfigResult, StdpConfig};

const CONFIG_FILE_NAME: &str = "stdp_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `STDP_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("STDP_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by STDP_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet STDP_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI overrides keyed by dotted path (`triplet.tau_plus`)
///
/// # Errors
///
/// Returns error if the file is missing, contains invalid TOML, or an override
/// is unknown or malformed. Parameter consistency is checked separately by
/// [`validate_config`](crate::validate_config).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<StdpConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: StdpConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn env_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `STDP_RESOLUTION_MS` -> `simulation.resolution_ms`
/// - `STDP_MIN_DELAY_STEPS` -> `simulation.min_delay_steps`
/// - `STDP_NEAREST_SPIKE_ONLY` -> `triplet.nearest_spike_only` and `long_range.nearest_spike_only`
/// - `STDP_LOG_LEVEL` -> `logging.level`
/// - `STDP_LOG_DIR` -> `logging.log_dir`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut StdpConfig) {
    if let Ok(value) = env::var("STDP_RESOLUTION_MS") {
        if let Ok(resolution) = value.parse::<f64>() {
            config.simulation.resolution_ms = resolution;
        }
    }
    if let Ok(value) = env::var("STDP_MIN_DELAY_STEPS") {
        if let Ok(steps) = value.parse::<i64>() {
            config.simulation.min_delay_steps = steps;
        }
    }
    if let Ok(value) = env::var("STDP_NEAREST_SPIKE_ONLY") {
        let nearest = env_flag(&value);
        config.triplet.nearest_spike_only = nearest;
        config.long_range.nearest_spike_only = nearest;
    }
    if let Ok(value) = env::var("STDP_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("STDP_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(value);
    }
}

/// Interpret a CLI string as a status value
fn status_value(text: &str) -> StatusValue {
    match text {
        "true" => StatusValue::Bool(true),
        "false" => StatusValue::Bool(false),
        _ => match text.parse::<f64>() {
            Ok(number) => StatusValue::Double(number),
            Err(_) => StatusValue::Text(text.to_string()),
        },
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {}", key, value)))
}

/// Apply CLI argument overrides to configuration
///
/// Keys are dotted paths such as `simulation.resolution_ms` or
/// `triplet.tau_x`. Rule parameters accept every alias the plasticity status
/// surface accepts.
///
/// # Errors
///
/// Returns `ConfigError::UnknownOverride` for keys that name nothing and
/// `ConfigError::InvalidValue` for values of the wrong type.
pub fn apply_cli_overrides(
    config: &mut StdpConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        let Some((section, field)) = key.split_once('.') else {
            return Err(ConfigError::UnknownOverride(key.clone()));
        };
        match (section, field) {
            ("simulation", "resolution_ms") => {
                config.simulation.resolution_ms = parse_number(key, value)?;
            }
            ("simulation", "min_delay_steps") => {
                config.simulation.min_delay_steps = parse_number(key, value)?;
            }
            ("simulation", "max_delay_steps") => {
                config.simulation.max_delay_steps = parse_number(key, value)?;
            }
            ("connection", "delay_ms" | "delay") => {
                config.connection.delay_ms = parse_number(key, value)?;
            }
            ("connection", "rport" | "receptor") => {
                config.connection.rport = parse_number(key, value)?;
            }
            ("logging", "level") => config.logging.level = value.clone(),
            ("logging", "log_dir") => config.logging.log_dir = PathBuf::from(value),
            ("logging", "retention_days") => {
                config.logging.retention_days = parse_number(key, value)?;
            }
            ("logging", "retention_runs") => {
                config.logging.retention_runs = parse_number(key, value)?;
            }
            ("triplet", field) => {
                let applied = config
                    .triplet
                    .apply(canonical_key(field), &status_value(value))
                    .map_err(|err| ConfigError::InvalidValue(format!("{}: {}", key, err)))?;
                if !applied {
                    return Err(ConfigError::UnknownOverride(key.clone()));
                }
            }
            ("long_range", field) => {
                let applied = config
                    .long_range
                    .apply(canonical_key(field), &status_value(value))
                    .map_err(|err| ConfigError::InvalidValue(format!("{}: {}", key, err)))?;
                if !applied {
                    return Err(ConfigError::UnknownOverride(key.clone()));
                }
            }
            _ => return Err(ConfigError::UnknownOverride(key.clone())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use stdp_plasticity::RulePolicy;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn cli(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("STDP_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("STDP_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_reported() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("STDP_CONFIG_PATH", "/nonexistent/stdp_configuration.toml");
        let result = find_config_file();
        env::remove_var("STDP_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "min_delay_steps = 4").unwrap();
        writeln!(file, "[triplet]").unwrap();
        writeln!(file, "tau_plus = 20.0").unwrap();
        writeln!(file, "A_minus = 0.05").unwrap();
        writeln!(file, "rule = \"triplet_nearest_spike\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.simulation.min_delay_steps, 4);
        assert!((config.triplet.tau_plus - 20.0).abs() < 1e-12);
        assert!((config.triplet.a_minus - 0.05).abs() < 1e-12);
        assert_eq!(config.triplet.rule, RulePolicy::TripletNearestSpike);
        // untouched fields keep their defaults
        assert!((config.triplet.tau_minus - 33.7).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[simulation\nresolution_ms = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = StdpConfig::default();

        env::set_var("STDP_RESOLUTION_MS", "0.25");
        env::set_var("STDP_NEAREST_SPIKE_ONLY", "yes");
        env::set_var("STDP_MIN_DELAY_STEPS", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("STDP_RESOLUTION_MS");
        env::remove_var("STDP_NEAREST_SPIKE_ONLY");
        env::remove_var("STDP_MIN_DELAY_STEPS");

        assert!((config.simulation.resolution_ms - 0.25).abs() < 1e-12);
        assert!(config.triplet.nearest_spike_only);
        assert!(config.long_range.nearest_spike_only);
        assert_eq!(config.simulation.min_delay_steps, 1);
    }

    #[test]
    fn test_cli_overrides_accept_aliases() {
        let mut config = StdpConfig::default();
        let args = cli(&[
            ("triplet.tau_x", "150"),
            ("triplet.a3_minus", "0.02"),
            ("triplet.nearest_spike", "true"),
            ("long_range.WP", "0.8"),
            ("simulation.resolution_ms", "0.5"),
            ("connection.delay", "2.5"),
        ]);

        apply_cli_overrides(&mut config, &args).unwrap();

        assert!((config.triplet.tau_plus_triplet - 150.0).abs() < 1e-12);
        assert!((config.triplet.a_minus_triplet - 0.02).abs() < 1e-12);
        assert!(config.triplet.nearest_spike_only);
        assert!((config.long_range.wp - 0.8).abs() < 1e-12);
        assert!((config.simulation.resolution_ms - 0.5).abs() < 1e-12);
        assert!((config.connection.delay_ms - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_cli_rejects_unknown_and_malformed() {
        let mut config = StdpConfig::default();
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli(&[("triplet.tau_z", "1")])),
            Err(ConfigError::UnknownOverride(_))
        ));
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli(&[("resolution_ms", "1")])),
            Err(ConfigError::UnknownOverride(_))
        ));
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli(&[("triplet.tau_plus", "fast")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli(&[("simulation.min_delay_steps", "1.5")])),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "resolution_ms = 1.0").unwrap();

        env::set_var("STDP_LOG_LEVEL", "debug");
        env::set_var("STDP_RESOLUTION_MS", "0.5");

        let args = cli(&[("logging.level", "trace")]);
        let config = load_config(Some(&config_path), Some(&args)).unwrap();

        env::remove_var("STDP_LOG_LEVEL");
        env::remove_var("STDP_RESOLUTION_MS");

        // CLI wins for level, env wins for resolution (no CLI override)
        assert_eq!(config.logging.level, "trace");
        assert!((config.simulation.resolution_ms - 0.5).abs() < 1e-12);
    }
}
