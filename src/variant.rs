//! One-generation update rules.
//!
//! Every variant samples the treatment assignment exactly once per generation and
//! reads the other compartment as it was at the start of the generation, except
//! [`MaxTreatment`], whose environment sees the updated hosts.

use crate::config::VariantKind;
use crate::model::State;
use crate::params::ParameterSet;
use crate::selection::{logistic_update, ratio_update};
use crate::source::RandomSource;
use crate::treatment::TreatmentSampler;

pub trait ModelVariant {
    /// Advance `state` by one generation.
    fn advance(
        &self,
        state: &mut State,
        params: &ParameterSet,
        sampler: &mut TreatmentSampler,
        rng: &mut RandomSource,
    );
}

/// Build the update rule selected by `kind`.
pub fn build(kind: VariantKind) -> Box<dyn ModelVariant> {
    match kind {
        VariantKind::Immediate => Box::new(ImmediateTreatment),
        VariantKind::MaxTreatment => Box::new(MaxTreatment),
        VariantKind::FitnessRatio => Box::new(FitnessRatio),
    }
}

/// Treated hosts become fully resistant in the generation they are treated.
pub struct ImmediateTreatment;

impl ModelVariant for ImmediateTreatment {
    fn advance(
        &self,
        state: &mut State,
        params: &ParameterSet,
        sampler: &mut TreatmentSampler,
        rng: &mut RandomSource,
    ) {
        let s = params.resistance_cost;
        let env = state.env;

        // Environment receives host bugs from before this generation's update.
        let env_new = logistic_update(env, state.mean_host(), params.env_mixing, s);

        let treated = sampler.sample(rng);
        for (host, &treated) in state.hosts.iter_mut().zip(treated) {
            *host = if treated {
                1.0
            } else {
                logistic_update(*host, env, params.host_mixing, s)
            };
        }

        state.env = env_new;
    }
}

/// Every host is selected first, then treatment can only raise resistance.
pub struct MaxTreatment;

impl ModelVariant for MaxTreatment {
    fn advance(
        &self,
        state: &mut State,
        params: &ParameterSet,
        sampler: &mut TreatmentSampler,
        rng: &mut RandomSource,
    ) {
        let s = params.resistance_cost;
        let env = state.env;

        for host in &mut state.hosts {
            *host = logistic_update(*host, env, params.host_mixing, s);
        }

        let treated = sampler.sample(rng);
        for (host, &treated) in state.hosts.iter_mut().zip(treated) {
            *host = host.max(if treated { 1.0 } else { 0.0 });
        }

        state.env = logistic_update(env, state.mean_host(), params.env_mixing, s);
    }
}

/// Treatment lowers the fitness of the susceptible strain instead of fixing resistance.
pub struct FitnessRatio;

impl ModelVariant for FitnessRatio {
    fn advance(
        &self,
        state: &mut State,
        params: &ParameterSet,
        sampler: &mut TreatmentSampler,
        rng: &mut RandomSource,
    ) {
        let treated = sampler.sample(rng);

        // Resistant strain pays the same cost everywhere.
        let w_res = 1.0 - params.resistance_cost;
        let w_sus_treated = 1.0 - params.treated_cost;
        let env = state.env;

        let env_new = ratio_update(env, state.mean_host(), params.env_mixing, w_res, 1.0);

        for (host, &treated) in state.hosts.iter_mut().zip(treated) {
            let w_sus = if treated { w_sus_treated } else { 1.0 };
            *host = ratio_update(*host, env, params.host_mixing, w_res, w_sus);
        }

        state.env = env_new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sample_config;
    use crate::selection::select_fraction;
    use crate::source::make_source;

    fn params(kind: VariantKind) -> ParameterSet {
        ParameterSet::from_config(&sample_config(kind)).unwrap()
    }

    fn spread_state(n_hosts: usize) -> State {
        State {
            hosts: (0..n_hosts).map(|i| i as f64 / n_hosts as f64).collect(),
            env: 0.3,
        }
    }

    #[test]
    fn immediate_treated_hosts_are_fully_resistant() {
        let params = params(VariantKind::Immediate);
        let mut sampler = TreatmentSampler::new(100, 40, 1.0).unwrap();
        let mut rng = make_source(5, 0);
        let mut state = spread_state(100);
        let before = state.clone();

        ImmediateTreatment.advance(&mut state, &params, &mut sampler, &mut rng);

        for i in 0..100 {
            if sampler.last()[i] {
                assert_eq!(state.hosts[i], 1.0);
            } else {
                let expected = logistic_update(before.hosts[i], before.env, 0.005, 0.01);
                assert_eq!(state.hosts[i], expected);
            }
        }
        let env = logistic_update(before.env, before.mean_host(), 0.05, 0.01);
        assert_eq!(state.env, env);
    }

    #[test]
    fn immediate_random_treatment_fixes_resistance() {
        let params = params(VariantKind::Immediate);
        let mut sampler = TreatmentSampler::new(500, 0, 0.3).unwrap();
        let mut rng = make_source(6, 0);
        let mut state = State::new(500, 1e-9, 1e-9);
        for _ in 0..20 {
            ImmediateTreatment.advance(&mut state, &params, &mut sampler, &mut rng);
            for (&host, &treated) in state.hosts.iter().zip(sampler.last()) {
                if treated {
                    assert_eq!(host, 1.0);
                }
            }
        }
    }

    #[test]
    fn max_treatment_never_lowers_treated_hosts() {
        let params = params(VariantKind::MaxTreatment);
        let mut sampler = TreatmentSampler::new(200, 0, 0.5).unwrap();
        let mut rng = make_source(7, 0);
        let mut state = spread_state(200);

        for _ in 0..10 {
            let before = state.clone();
            MaxTreatment.advance(&mut state, &params, &mut sampler, &mut rng);
            for i in 0..200 {
                if sampler.last()[i] {
                    assert!(state.hosts[i] >= before.hosts[i]);
                    assert_eq!(state.hosts[i], 1.0);
                } else {
                    let expected = logistic_update(before.hosts[i], before.env, 0.005, 0.01);
                    assert_eq!(state.hosts[i], expected);
                }
            }
        }
    }

    #[test]
    fn max_treatment_environment_sees_treated_hosts() {
        let params = params(VariantKind::MaxTreatment);
        let mut sampler = TreatmentSampler::new(50, 0, 1.0).unwrap();
        let mut rng = make_source(8, 0);
        let mut state = State::new(50, 0.0, 0.0);

        MaxTreatment.advance(&mut state, &params, &mut sampler, &mut rng);

        assert_eq!(state.mean_host(), 1.0);
        assert_eq!(state.env, logistic_update(0.0, 1.0, 0.05, 0.01));
    }

    #[test]
    fn fitness_ratio_updates_compartments_simultaneously() {
        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.coefs.treated_cost = 0.8;
        cfg.coefs.resistance_cost = 0.02;
        let params = ParameterSet::from_config(&cfg).unwrap();
        let mut sampler = TreatmentSampler::new(80, 20, 0.5).unwrap();
        let mut rng = make_source(9, 0);
        let mut state = spread_state(80);
        let before = state.clone();

        FitnessRatio.advance(&mut state, &params, &mut sampler, &mut rng);

        let w_res = 1.0 - 0.02;
        let env =
            0.05 * before.mean_host() + (1.0 - 0.05) * select_fraction(before.env, w_res, 1.0);
        assert_eq!(state.env, env);
        for i in 0..80 {
            let w_sus = if sampler.last()[i] { 1.0 - 0.8 } else { 1.0 };
            let selected = select_fraction(before.hosts[i], w_res, w_sus);
            let expected = 0.005 * before.env + (1.0 - 0.005) * selected;
            assert_eq!(state.hosts[i], expected);
        }
        assert!(sampler.last()[..20].iter().all(|&t| !t));
    }

    #[test]
    fn variants_keep_fractions_in_unit_interval() {
        for kind in [
            VariantKind::Immediate,
            VariantKind::MaxTreatment,
            VariantKind::FitnessRatio,
        ] {
            let params = params(kind);
            let variant = build(kind);
            let mut sampler = TreatmentSampler::new(300, 100, 0.1).unwrap();
            let mut rng = make_source(10, 0);
            let mut state = spread_state(300);
            for _ in 0..200 {
                variant.advance(&mut state, &params, &mut sampler, &mut rng);
                assert!(state.hosts.iter().all(|h| (0.0..=1.0).contains(h)));
                assert!((0.0..=1.0).contains(&state.env));
            }
        }
    }
}
