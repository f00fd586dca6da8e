// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plasticity rule variants and the spike-triggered update kernels
//!
//! ## Triplet rule
//!
//! ```text
//! Pre-synaptic spike (depression):
//!     w  -= o1 * (A_minus + A_minus_triplet * r2)
//!     r1 += 1, r2 += 1
//!
//! Post-synaptic spike (potentiation):
//!     w  += r1 * (A_plus + A_plus_triplet * o2)
//!     o1 += 1, o2 += 1
//!
//! r1, r2 = trace_pre_fast, trace_pre_slow
//! o1, o2 = trace_post_fast, trace_post_slow
//! ```
//!
//! Every trace read by a kernel has already been decayed to the spike time and
//! not yet incremented by that spike. The weight is clamped right after the
//! additive update; the nearest-spike restriction caps each trace at `1.0` right
//! after its increment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::params::{LongRangeParameters, TripletParameters};
use crate::trace::TraceState;

/// Which increment, clamp and extra-term behaviours apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePolicy {
    /// Pair terms only; triplet amplitudes are ignored
    PairBased,
    /// Full pair + triplet rule over the whole trace history
    #[default]
    Triplet,
    /// Triplet rule restricted to the most recent neighbouring spike
    TripletNearestSpike,
    /// Long-timescale homeostatic extension (clock-driven unit only)
    LongRangeHomeostatic,
}

impl RulePolicy {
    pub const ALL: [RulePolicy; 4] = [
        RulePolicy::PairBased,
        RulePolicy::Triplet,
        RulePolicy::TripletNearestSpike,
        RulePolicy::LongRangeHomeostatic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RulePolicy::PairBased => "pair_based",
            RulePolicy::Triplet => "triplet",
            RulePolicy::TripletNearestSpike => "triplet_nearest_spike",
            RulePolicy::LongRangeHomeostatic => "long_range_homeostatic",
        }
    }

    /// Whether the slow traces enter the weight update
    pub fn uses_triplet_terms(self) -> bool {
        !matches!(self, RulePolicy::PairBased)
    }

    /// Whether the policy itself imposes the nearest-spike cap
    pub fn forces_nearest_spike(self) -> bool {
        matches!(self, RulePolicy::TripletNearestSpike)
    }

    pub fn is_long_range(self) -> bool {
        matches!(self, RulePolicy::LongRangeHomeostatic)
    }
}

impl fmt::Display for RulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RulePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RulePolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownRule(s.to_string()))
    }
}

#[inline]
fn bump(trace: &mut f64, nearest_spike: bool) {
    *trace += 1.0;
    if nearest_spike {
        *trace = trace.min(1.0);
    }
}

/// Depression and pre-synaptic increments at a pre-synaptic spike
#[inline]
pub(crate) fn on_pre_spike(state: &mut TraceState, params: &TripletParameters) {
    let triplet = if params.rule.uses_triplet_terms() {
        params.a_minus_triplet * state.trace_pre_slow
    } else {
        0.0
    };
    state.weight -= state.trace_post_fast * (params.a_minus + triplet);
    state.weight = params.bounds().clamp(state.weight);

    let nearest = params.nearest_spike();
    bump(&mut state.trace_pre_fast, nearest);
    bump(&mut state.trace_pre_slow, nearest);
}

/// Potentiation and post-synaptic increments at a post-synaptic spike
#[inline]
pub(crate) fn on_post_spike(state: &mut TraceState, params: &TripletParameters) {
    let triplet = if params.rule.uses_triplet_terms() {
        params.a_plus_triplet * state.trace_post_slow
    } else {
        0.0
    };
    state.weight += state.trace_pre_fast * (params.a_plus + triplet);
    state.weight = params.bounds().clamp(state.weight);

    let nearest = params.nearest_spike();
    bump(&mut state.trace_post_fast, nearest);
    bump(&mut state.trace_post_slow, nearest);
}

/// Continuous part of the long-range rule, integrated over one step of `h` ms
///
/// ```text
/// w_ref += (w - w_ref - P * w_ref * (WP/2 - w_ref) * (WP - w_ref)) / tau_const * h
/// C     += (-C / tau_hom + Zht^2 / 1000) * h
/// ```
#[inline]
pub(crate) fn long_range_homeostasis(state: &mut TraceState, params: &LongRangeParameters, h: f64) {
    let weight = state.weight;
    let Some(long_range) = state.long_range.as_mut() else {
        return;
    };
    let w_ref = long_range.weight_ref;
    long_range.weight_ref += (weight
        - w_ref
        - params.p * w_ref * (params.wp / 2.0 - w_ref) * (params.wp - w_ref))
        / params.tau_const
        * h;
    long_range.c += (-long_range.c / params.tau_hom + long_range.zht * long_range.zht / 1000.0) * h;
}

/// Doublet LTD plus transmitter-induced drift at a pre-synaptic spike
#[inline]
pub(crate) fn on_pre_spike_long_range(state: &mut TraceState, params: &LongRangeParameters) {
    let b = state.long_range.map_or(0.0, |long_range| long_range.b);
    state.weight -= b * state.trace_post_fast;
    state.weight += params.delta;
    state.weight = params.bounds().clamp(state.weight);

    bump(&mut state.trace_pre_fast, params.nearest_spike_only);
}

/// Triplet LTP plus heterosynaptic pull towards `weight_ref` at a post-synaptic spike
#[inline]
pub(crate) fn on_post_spike_long_range(state: &mut TraceState, params: &LongRangeParameters) {
    let w_ref = state.long_range.map_or(1.0, |long_range| long_range.weight_ref);
    let z_minus = state.trace_post_fast;
    state.weight += params.a * state.trace_pre_fast * state.trace_post_slow
        - params.beta * (state.weight - w_ref) * z_minus * z_minus * z_minus;
    state.weight = params.bounds().clamp(state.weight);

    let nearest = params.nearest_spike_only;
    bump(&mut state.trace_post_fast, nearest);
    bump(&mut state.trace_post_slow, nearest);
    if let Some(long_range) = state.long_range.as_mut() {
        bump(&mut long_range.zht, nearest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names_round_trip() {
        for policy in RulePolicy::ALL {
            assert_eq!(policy.name().parse::<RulePolicy>(), Ok(policy));
        }
        assert!("stdp".parse::<RulePolicy>().is_err());
    }

    #[test]
    fn test_pair_based_ignores_triplet_amplitudes() {
        let params = TripletParameters {
            rule: RulePolicy::PairBased,
            ..Default::default()
        };
        let mut state = TraceState::with_weight(1.0);
        state.trace_pre_fast = 0.5;
        state.trace_post_slow = 3.0;
        on_post_spike(&mut state, &params);
        assert!((state.weight - (1.0 + 0.5 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_triplet_potentiation_uses_slow_post_trace() {
        let params = TripletParameters::default();
        let mut state = TraceState::with_weight(1.0);
        state.trace_pre_fast = 0.5;
        state.trace_post_slow = 3.0;
        on_post_spike(&mut state, &params);
        assert!((state.weight - (1.0 + 0.5 * (0.1 + 0.1 * 3.0))).abs() < 1e-12);
        assert_eq!(state.trace_post_fast, 1.0);
        assert_eq!(state.trace_post_slow, 4.0);
    }

    #[test]
    fn test_nearest_spike_caps_increments() {
        let params = TripletParameters {
            rule: RulePolicy::TripletNearestSpike,
            ..Default::default()
        };
        let mut state = TraceState::with_weight(1.0);
        state.trace_pre_fast = 0.9;
        state.trace_pre_slow = 2.7;
        on_pre_spike(&mut state, &params);
        assert_eq!(state.trace_pre_fast, 1.0);
        assert_eq!(state.trace_pre_slow, 1.0);
    }

    #[test]
    fn test_depression_clamped_at_lower_bound() {
        let params = TripletParameters {
            a_minus: 5.0,
            ..Default::default()
        };
        let mut state = TraceState::with_weight(0.2);
        state.trace_post_fast = 1.0;
        on_pre_spike(&mut state, &params);
        assert_eq!(state.weight, 0.0);
    }

    #[test]
    fn test_long_range_post_spike_bumps_zht() {
        let params = LongRangeParameters::default();
        let mut state = TraceState::long_range(1.0);
        on_post_spike_long_range(&mut state, &params);
        assert_eq!(state.long_range.unwrap().zht, 1.0);
        assert_eq!(state.trace_post_slow, 1.0);
        // no pre trace yet, weight equals reference: no change
        assert_eq!(state.weight, 1.0);
    }

    #[test]
    fn test_long_range_pre_spike_depresses_by_b() {
        let params = LongRangeParameters {
            delta: 0.0,
            ..Default::default()
        };
        let mut state = TraceState::long_range(1.0);
        state.trace_post_fast = 2.0;
        on_pre_spike_long_range(&mut state, &params);
        assert!((state.weight - (1.0 - 5e-3 * 2.0)).abs() < 1e-15);
        assert_eq!(state.trace_pre_fast, 1.0);
    }
}
