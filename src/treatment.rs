use crate::source::RandomSource;
use anyhow::{Result, bail};
use rand_distr::{Bernoulli, Distribution};

/// Per-generation treatment assignment.
///
/// The first `n_zero` hosts are exempt and never treated. Each of the remaining hosts is
/// treated independently with the per-consumer probability.
pub struct TreatmentSampler {
    n_zero: usize,
    dist: Bernoulli,
    treated: Vec<bool>,
}

impl TreatmentSampler {
    pub fn new(n_hosts: usize, n_zero: usize, p_treatment: f64) -> Result<Self> {
        if n_zero > n_hosts {
            bail!("number of exempt hosts must be at most {n_hosts}, but is {n_zero}");
        }
        let dist = Bernoulli::new(p_treatment)?;
        Ok(Self {
            n_zero,
            dist,
            treated: vec![false; n_hosts],
        })
    }

    /// Draw a new assignment, consuming one Bernoulli draw per consumer in host order.
    pub fn sample(&mut self, rng: &mut RandomSource) -> &[bool] {
        for flag in &mut self.treated[self.n_zero..] {
            *flag = self.dist.sample(rng);
        }
        &self.treated
    }

    /// Assignment drawn by the last call to [`TreatmentSampler::sample`].
    pub fn last(&self) -> &[bool] {
        &self.treated
    }
}
