// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pairing-frequency experiment.
//!
//! Drives a clock-driven triplet unit with the Pfister & Gerstner pairing
//! protocol and prints one JSON line per frequency, timing and variant
//! (all-to-all or nearest-spike) with the resulting weight change.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use tracing::info;
use triplet_stdp::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    validate_config, StdpConfig,
};
use triplet_stdp::observability::{
    debug_flags_help, init_logging, parse_debug_flags, FileLogging, LogFormat, ObservabilityConfig,
};
use triplet_stdp::pairing::{frequency_sweep, PairingProtocol};
use triplet_stdp::runtime::FixedClock;

const DEFAULT_FREQUENCIES: [f64; 7] = [1.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0];

struct Args {
    config: Option<PathBuf>,
    frequencies: Vec<f64>,
    protocol: PairingProtocol,
    overrides: HashMap<String, String>,
    log_files: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: pairing_experiment [--config <path>] [--frequencies <hz,hz,...>] [--pairs <n>]\n\
         \x20                         [--delta-ms <ms>] [--weight <w>] [--set <section.key>=<value>]...\n\
         \x20                         [--log-files] [--debug-<crate>]...\n\n\
         Defaults:\n\
         - config: stdp_configuration.toml (STDP_CONFIG_PATH, cwd and parents), built-in defaults if absent\n\
         - frequencies: 1,5,10,20,30,40,50\n\
         - pairs: 60\n\
         - delta-ms: 10 (run as +10 and -10)\n\
         - weight: 1.0\n\n\
         {}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let value = value.unwrap_or_else(|| usage_and_exit());
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid value for {flag}: {value}");
        usage_and_exit();
    })
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        frequencies: DEFAULT_FREQUENCIES.to_vec(),
        protocol: PairingProtocol::default(),
        overrides: HashMap::new(),
        log_files: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config = Some(PathBuf::from(v));
            }
            "--frequencies" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.frequencies = v
                    .split(',')
                    .map(|f| parse_value("--frequencies", Some(f.trim().to_string())))
                    .collect();
            }
            "--pairs" => parsed.protocol.pairs = parse_value("--pairs", args.next()),
            "--delta-ms" => parsed.protocol.delta_ms = parse_value("--delta-ms", args.next()),
            "--weight" => parsed.protocol.initial_weight = parse_value("--weight", args.next()),
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let Some((key, value)) = v.split_once('=') else {
                    eprintln!("Expected <section.key>=<value>, got: {v}");
                    usage_and_exit();
                };
                parsed.overrides.insert(key.to_string(), value.to_string());
            }
            "--log-files" => parsed.log_files = true,
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

fn load(args: &Args) -> StdpConfig {
    let loaded = match &args.config {
        Some(path) => load_config(Some(path.as_path()), Some(&args.overrides)),
        None => match find_config_file() {
            Ok(path) => load_config(Some(path.as_path()), Some(&args.overrides)),
            Err(_) => {
                let mut config = StdpConfig::default();
                apply_environment_overrides(&mut config);
                apply_cli_overrides(&mut config, &args.overrides).map(|()| config)
            }
        },
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        process::exit(2);
    });
    if let Err(e) = validate_config(&config) {
        eprintln!("{e}");
        process::exit(2);
    }
    config
}

fn main() {
    let args = parse_args();
    let config = load(&args);

    let observability = ObservabilityConfig {
        level: config.logging.level.clone(),
        format: LogFormat::Text,
        file: args.log_files.then(|| FileLogging {
            dir: config.logging.log_dir.clone(),
            retention_days: config.logging.retention_days,
            retention_runs: config.logging.retention_runs,
        }),
    };
    let _logging = init_logging(&parse_debug_flags(), &observability).unwrap_or_else(|e| {
        eprintln!("Failed to initialise logging: {e:#}");
        process::exit(2);
    });

    let simulation = &config.simulation;
    let clock = FixedClock::new(
        simulation.resolution_ms,
        simulation.min_delay_steps,
        simulation.max_delay_steps,
    )
    .unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(2);
    });

    info!(
        resolution_ms = simulation.resolution_ms,
        pairs = args.protocol.pairs,
        delta_ms = args.protocol.delta_ms,
        rule = %config.triplet.rule,
        "Starting pairing experiment"
    );

    let results = frequency_sweep(config.triplet, clock, &args.frequencies, args.protocol)
        .unwrap_or_else(|e| {
            eprintln!("Pairing experiment failed: {e}");
            process::exit(1);
        });

    for result in &results {
        match serde_json::to_string(result) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("Failed to serialize result: {e}");
                process::exit(1);
            }
        }
    }
    info!(runs = results.len(), "Pairing experiment finished");
}
