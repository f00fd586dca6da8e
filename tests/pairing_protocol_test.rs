// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Frequency dependence of the pairing protocol with the visual cortex fit
//! (all-to-all, minimal model) of Pfister & Gerstner (2006)

use triplet_stdp::pairing::{frequency_sweep, PairingProtocol, PairingVariant};
use triplet_stdp::prelude::*;

fn visual_cortex() -> TripletParameters {
    TripletParameters {
        tau_plus: 16.8,
        tau_plus_triplet: 101.0,
        tau_minus: 33.7,
        tau_minus_triplet: 125.0,
        a_plus: 5e-10,
        a_plus_triplet: 6.2e-3,
        a_minus: 7e-3,
        a_minus_triplet: 2.3e-4,
        ..TripletParameters::default()
    }
}

fn clock() -> FixedClock {
    FixedClock::new(0.1, 10, 10).unwrap()
}

fn change(rho_hz: f64, delta_ms: f64, variant: PairingVariant) -> f64 {
    let protocol = PairingProtocol {
        rho_hz,
        delta_ms,
        ..PairingProtocol::default()
    };
    protocol.run(variant.apply(visual_cortex()), clock()).unwrap()
}

#[test]
fn test_post_before_pre_flips_sign_with_frequency() {
    assert!(change(1.0, -10.0, PairingVariant::AllToAll) < -0.3);
    assert!(change(50.0, -10.0, PairingVariant::AllToAll) > 0.7);
}

#[test]
fn test_pre_before_post_grows_with_frequency() {
    let changes: Vec<f64> = [1.0, 10.0, 20.0, 40.0, 50.0]
        .iter()
        .map(|&rho| change(rho, 10.0, PairingVariant::AllToAll))
        .collect();
    assert!(changes.windows(2).all(|pair| pair[0] < pair[1]));
    assert!((changes[0] - 6.770622420204653e-5).abs() < 1e-10);
}

#[test]
fn test_variants_agree_at_low_frequency() {
    // traces have decayed to nothing between pairs one second apart
    for delta in [10.0, -10.0] {
        let all = change(1.0, delta, PairingVariant::AllToAll);
        let nearest = change(1.0, delta, PairingVariant::NearestSpike);
        assert!((all - nearest).abs() < 1e-6);
    }
    let all = change(50.0, 10.0, PairingVariant::AllToAll);
    let nearest = change(50.0, 10.0, PairingVariant::NearestSpike);
    assert!(nearest < 0.0 && all > 0.0);
}

#[test]
fn test_sweep_layout() {
    let template = PairingProtocol {
        pairs: 5,
        ..PairingProtocol::default()
    };
    let results = frequency_sweep(visual_cortex(), clock(), &[1.0, 20.0], template).unwrap();
    assert_eq!(results.len(), 8);
    assert_eq!(results[0].variant, PairingVariant::AllToAll);
    assert_eq!(results[1].variant, PairingVariant::NearestSpike);
    assert!((results[2].delta_ms + 10.0).abs() < 1e-12);
    assert!((results[4].rho_hz - 20.0).abs() < 1e-12);

    let line = serde_json::to_string(&results[1]).unwrap();
    assert!(line.contains("\"variant\":\"nearest_spike\""));
}

#[test]
fn test_config_parameters_drive_the_protocol() {
    let mut config = StdpConfig::default();
    config.triplet = visual_cortex();
    validate_config(&config).unwrap();

    let clock = FixedClock::new(
        config.simulation.resolution_ms,
        config.simulation.min_delay_steps,
        config.simulation.max_delay_steps,
    )
    .unwrap();
    let protocol = PairingProtocol {
        rho_hz: 50.0,
        delta_ms: -10.0,
        ..PairingProtocol::default()
    };
    let via_config = protocol.run(config.triplet, clock).unwrap();
    assert!((via_config - change(50.0, -10.0, PairingVariant::AllToAll)).abs() < 1e-12);
}
