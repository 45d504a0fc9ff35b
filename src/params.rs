use crate::config::{Coefficients, Config, TreatmentBasis, VariantKind};
use anyhow::{Context, Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

/// Validated parameters of a single run.
///
/// Built fresh for every run and never modified afterwards.
#[derive(Debug, PartialEq, Clone)]
pub struct ParameterSet {
    pub variant: VariantKind,

    pub resistance_cost: f64,
    pub treated_cost: f64,

    pub env_mixing: f64,
    pub host_mixing: f64,

    pub n_hosts: usize,
    pub host_init: f64,
    pub env_init: f64,

    pub n_generations: usize,
    pub log_interval: usize,

    /// Number of hosts exempt from treatment.
    pub n_zero: usize,
    /// Treatment probability per consumer and generation.
    pub p_treatment: f64,
}

impl ParameterSet {
    /// Build the parameters of the base point of a configuration.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg, &cfg.coefs)
    }

    /// Build the parameters of a run using `coefs` in place of the configured coefficients.
    ///
    /// # Errors
    /// Returns an error if any probability or fraction is outside `[0, 1]`, if the
    /// selection update could divide by zero, or if the derived treatment probability
    /// per consumer is not a probability.
    pub fn new(cfg: &Config, coefs: &Coefficients) -> Result<Self> {
        let n_hosts = cfg.init.n_hosts;
        check_num(n_hosts, 1..).context("invalid number of hosts")?;
        check_num(cfg.init.host_resistance, 0.0..=1.0).context("invalid host resistance")?;
        check_num(cfg.init.env_resistance, 0.0..=1.0).context("invalid env resistance")?;
        check_num(cfg.output.log_interval, 1..).context("invalid log interval")?;

        check_num(coefs.resistance_cost, 0.0..1.0).context("invalid resistance cost")?;
        check_num(coefs.treated_cost, 0.0..=1.0).context("invalid treated cost")?;
        check_num(coefs.treatment_rate, 0.0..).context("invalid treatment rate")?;
        check_num(coefs.exempt_fraction, 0.0..=1.0).context("invalid exempt fraction")?;
        check_num(coefs.env_mixing, 0.0..=1.0).context("invalid env mixing rate")?;
        check_num(coefs.host_mixing, 0.0..=1.0).context("invalid host mixing rate")?;
        if !(coefs.generation_time > 0.0 && coefs.generation_time.is_finite()) {
            bail!(
                "generation time must be positive, but is {:?}",
                coefs.generation_time
            );
        }

        let variant = cfg.model.variant;
        if variant != VariantKind::FitnessRatio {
            // Keeps the logistic update inside [0, 1].
            let mixing = coefs.env_mixing.max(coefs.host_mixing);
            if coefs.resistance_cost + mixing > 1.0 {
                bail!(
                    "resistance cost plus mixing rate must be at most 1, but is {}",
                    coefs.resistance_cost + mixing
                );
            }
        }

        let n_zero = (coefs.exempt_fraction * n_hosts as f64).floor() as usize;
        let n_consumer = n_hosts - n_zero;

        let rate_per_gen = coefs.treatment_rate * coefs.generation_time;
        let p_treatment = match cfg.model.treatment_basis {
            TreatmentBasis::Consumer => rate_per_gen,
            TreatmentBasis::Population if n_consumer == 0 => {
                if rate_per_gen > 0.0 {
                    bail!("population treatment rate {rate_per_gen} needs at least one consumer");
                }
                0.0
            }
            TreatmentBasis::Population => {
                let f_consumer = n_consumer as f64 / n_hosts as f64;
                rate_per_gen / f_consumer
            }
        };
        check_num(p_treatment, 0.0..=1.0).context("invalid treatment probability per consumer")?;

        Ok(Self {
            variant,
            resistance_cost: coefs.resistance_cost,
            treated_cost: coefs.treated_cost,
            env_mixing: coefs.env_mixing,
            host_mixing: coefs.host_mixing,
            n_hosts,
            host_init: cfg.init.host_resistance,
            env_init: cfg.init.env_resistance,
            n_generations: cfg.output.n_generations,
            log_interval: cfg.output.log_interval,
            n_zero,
            p_treatment,
        })
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sample_config;

    #[test]
    fn population_basis_divides_by_consumer_fraction() {
        let mut cfg = sample_config(VariantKind::MaxTreatment);
        cfg.coefs.treatment_rate = 2.0;
        cfg.coefs.exempt_fraction = 0.5;
        let params = ParameterSet::from_config(&cfg).unwrap();
        assert_eq!(params.n_zero, 500);
        let expected = 2.0 * cfg.coefs.generation_time / 0.5;
        assert!((params.p_treatment - expected).abs() < 1e-15);
    }

    #[test]
    fn consumer_basis_ignores_exempt_fraction() {
        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.model.treatment_basis = TreatmentBasis::Consumer;
        cfg.coefs.exempt_fraction = 0.75;
        let params = ParameterSet::from_config(&cfg).unwrap();
        assert_eq!(params.n_zero, 750);
        assert_eq!(params.p_treatment, 0.8 * cfg.coefs.generation_time);
    }

    #[test]
    fn bases_agree_without_exempt_hosts() {
        let mut cfg = sample_config(VariantKind::Immediate);
        let population = ParameterSet::from_config(&cfg).unwrap();
        cfg.model.treatment_basis = TreatmentBasis::Consumer;
        let consumer = ParameterSet::from_config(&cfg).unwrap();
        assert_eq!(population.p_treatment, consumer.p_treatment);
        assert_eq!(population.n_zero, 0);
    }

    #[test]
    fn rejects_treatment_probability_above_one() {
        let mut cfg = sample_config(VariantKind::Immediate);
        cfg.coefs.treatment_rate = 300.0;
        assert!(ParameterSet::from_config(&cfg).is_err());

        let mut cfg = sample_config(VariantKind::Immediate);
        cfg.coefs.exempt_fraction = 0.999;
        cfg.coefs.treatment_rate = 2.0;
        assert!(ParameterSet::from_config(&cfg).is_err());
    }

    #[test]
    fn zero_consumers_need_zero_treatment() {
        let mut cfg = sample_config(VariantKind::Immediate);
        cfg.coefs.exempt_fraction = 1.0;
        assert!(ParameterSet::from_config(&cfg).is_err());

        cfg.coefs.treatment_rate = 0.0;
        let params = ParameterSet::from_config(&cfg).unwrap();
        assert_eq!(params.n_zero, 1000);
        assert_eq!(params.p_treatment, 0.0);
    }

    #[test]
    fn rejects_out_of_range_fractions() {
        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.coefs.env_mixing = 1.2;
        assert!(ParameterSet::from_config(&cfg).is_err());

        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.coefs.resistance_cost = 1.0;
        assert!(ParameterSet::from_config(&cfg).is_err());

        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.init.host_resistance = -0.1;
        assert!(ParameterSet::from_config(&cfg).is_err());

        let mut cfg = sample_config(VariantKind::FitnessRatio);
        cfg.coefs.treated_cost = f64::NAN;
        assert!(ParameterSet::from_config(&cfg).is_err());
    }

    #[test]
    fn rejects_degenerate_logistic_update() {
        let mut cfg = sample_config(VariantKind::Immediate);
        cfg.coefs.resistance_cost = 0.98;
        assert!(ParameterSet::from_config(&cfg).is_err());

        cfg.model.variant = VariantKind::FitnessRatio;
        assert!(ParameterSet::from_config(&cfg).is_ok());
    }
}
