use crate::logger::Logger;
use crate::model::{State, Summary};
use crate::params::ParameterSet;
use crate::source::RandomSource;
use crate::treatment::TreatmentSampler;
use crate::variant::{self, ModelVariant};
use anyhow::{Context, Result};

/// Simulation engine.
///
/// Holds the parameters, current state, update rule and random number generator,
/// and advances the state one generation at a time.
pub struct Engine {
    params: ParameterSet,
    state: State,
    variant: Box<dyn ModelVariant>,
    sampler: TreatmentSampler,
    rng: RandomSource,
    generation: usize,
}

impl Engine {
    /// Create a new `Engine` with every host and the environment at their initial resistance.
    pub fn new(params: ParameterSet, rng: RandomSource) -> Result<Self> {
        let sampler = TreatmentSampler::new(params.n_hosts, params.n_zero, params.p_treatment)
            .context("failed to construct treatment sampler")?;
        let state = State::new(params.n_hosts, params.host_init, params.env_init);
        let variant = variant::build(params.variant);
        log::debug!("{params:?}");

        Ok(Self {
            params,
            state,
            variant,
            sampler,
            rng,
            generation: 0,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of generations performed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Treatment assignment of the last generation.
    pub fn treated(&self) -> &[bool] {
        self.sampler.last()
    }

    /// Perform a single generation.
    pub fn advance(&mut self) {
        self.variant.advance(
            &mut self.state,
            &self.params,
            &mut self.sampler,
            &mut self.rng,
        );
        self.generation += 1;
    }

    /// Perform `n_generations` generations.
    pub fn advance_n(&mut self, n_generations: usize) {
        for _ in 0..n_generations {
            self.advance();
        }
    }

    /// Perform the configured number of generations and return the final summary.
    ///
    /// If a `logger` is given it receives the header, then a record every
    /// `log_interval` generations and one after the last generation.
    pub fn run(&mut self, mut logger: Option<&mut dyn Logger>) -> Result<Summary> {
        if let Some(logger) = logger.as_deref_mut() {
            logger.header().context("failed to log header")?;
        }

        let n_generations = self.params.n_generations;
        let mut n_complete = 0;
        while n_complete < n_generations {
            let this_interval = self.params.log_interval.min(n_generations - n_complete);
            self.advance_n(this_interval);
            n_complete += this_interval;

            let summary = self.state.summary();
            log::debug!(
                "generation {}: host {} env {}",
                self.generation,
                summary.host,
                summary.env
            );
            if let Some(logger) = logger.as_deref_mut() {
                logger
                    .record(self.generation, &summary)
                    .context("failed to log record")?;
            }
        }

        Ok(self.state.summary())
    }
}
