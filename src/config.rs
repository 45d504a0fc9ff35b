use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model variant and treatment parameterization.
    pub model: ModelConfig,
    /// Scalar model coefficients.
    pub coefs: Coefficients,
    /// Initial condition.
    pub init: InitConfig,
    /// Run length and logging.
    pub output: OutputConfig,
    /// Parameter sweep axes, outermost first.
    #[serde(default)]
    pub sweep: Vec<SweepAxis>,
}

/// One-generation update rule.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Treated hosts become fully resistant, others follow logistic selection.
    Immediate,
    /// Logistic selection for every host, then treated hosts are raised to full resistance.
    MaxTreatment,
    /// Treatment lowers the fitness of the susceptible strain.
    FitnessRatio,
}

/// Meaning of the treatment rate.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentBasis {
    /// Treatments per year averaged over every host, exempt ones included.
    #[default]
    Population,
    /// Treatments per year for each consumer.
    Consumer,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub variant: VariantKind,
    #[serde(default)]
    pub treatment_basis: TreatmentBasis,
}

/// Scalar model coefficients.
///
/// Every field can be used as a sweep parameter.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coefficients {
    /// Fitness cost of the resistant strain without treatment.
    pub resistance_cost: f64,
    /// Fitness cost of the susceptible strain during treatment (fitness-ratio variant).
    #[serde(default = "default_treated_cost")]
    pub treated_cost: f64,
    /// Treatments per year, see [`TreatmentBasis`].
    pub treatment_rate: f64,
    /// Fraction of hosts that never get treated.
    #[serde(default)]
    pub exempt_fraction: f64,
    /// Fraction of the environment replaced by host-shed bacteria per generation.
    pub env_mixing: f64,
    /// Fraction of each host's bacteria replaced by environmental bacteria per generation.
    pub host_mixing: f64,
    /// Generation time in years.
    pub generation_time: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitConfig {
    /// Number of hosts.
    pub n_hosts: usize,
    /// Initial resistant fraction in every host.
    #[serde(default = "default_resistance")]
    pub host_resistance: f64,
    /// Initial resistant fraction in the environment.
    #[serde(default = "default_resistance")]
    pub env_resistance: f64,
    /// Base seed of the random number generator.
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of generations per run.
    pub n_generations: usize,
    /// Number of generations between trajectory records.
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
}

/// Values taken by one coefficient in a sweep.
///
/// Exactly one of `values` and `linspace` must be given.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepAxis {
    /// Name of the swept field of [`Coefficients`].
    pub param: String,
    pub values: Option<Vec<f64>>,
    pub linspace: Option<Linspace>,
}

/// Evenly spaced values over `[start, stop]`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Linspace {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

fn default_treated_cost() -> f64 {
    1.0
}

fn default_resistance() -> f64 {
    1e-9
}

fn default_log_interval() -> usize {
    100
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed,
    /// or if the sweep axes are malformed.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for axis in &self.sweep {
            if !seen.insert(axis.param.as_str()) {
                bail!("parameter {:?} is swept more than once", axis.param);
            }
            axis.points()
                .with_context(|| format!("invalid sweep axis {:?}", axis.param))?;
        }
        Ok(())
    }
}

impl SweepAxis {
    /// Values of this axis in sweep order.
    pub fn points(&self) -> Result<Vec<f64>> {
        let points = match (&self.values, &self.linspace) {
            (Some(values), None) => values.clone(),
            (None, Some(linspace)) => linspace.points(),
            _ => bail!("axis must have exactly one of values and linspace"),
        };
        if points.is_empty() {
            bail!("axis must have at least one value");
        }
        Ok(points)
    }
}

impl Linspace {
    pub fn points(&self) -> Vec<f64> {
        match self.num {
            0 => Vec::new(),
            1 => vec![self.start],
            num => {
                let step = (self.stop - self.start) / (num - 1) as f64;
                let mut points: Vec<_> = (0..num)
                    .map(|i| self.start + i as f64 * step)
                    .collect();
                points[num - 1] = self.stop;
                points
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_config(variant: VariantKind) -> Config {
    Config {
        model: ModelConfig {
            variant,
            treatment_basis: TreatmentBasis::Population,
        },
        coefs: Coefficients {
            resistance_cost: 0.01,
            treated_cost: 1.0,
            treatment_rate: 0.8,
            exempt_fraction: 0.0,
            env_mixing: 0.05,
            host_mixing: 0.005,
            generation_time: 1.0 / 219.0,
        },
        init: InitConfig {
            n_hosts: 1000,
            host_resistance: 1e-9,
            env_resistance: 1e-9,
            seed: Some(42),
        },
        output: OutputConfig {
            n_generations: 500,
            log_interval: 100,
        },
        sweep: Vec::new(),
    }
}
