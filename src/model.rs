//! Simulation data types.

/// State of the simulation at a given generation.
///
/// Holds the resistant fraction of every host and of the shared environment.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Resistant fraction in each host.
    pub hosts: Vec<f64>,

    /// Resistant fraction in the environment.
    pub env: f64,
}

impl State {
    /// Create a state where every host starts with the same resistant fraction.
    pub fn new(n_hosts: usize, host_init: f64, env_init: f64) -> Self {
        Self {
            hosts: vec![host_init; n_hosts],
            env: env_init,
        }
    }

    /// Mean resistant fraction over all hosts.
    pub fn mean_host(&self) -> f64 {
        self.hosts.iter().sum::<f64>() / self.hosts.len() as f64
    }

    pub fn summary(&self) -> Summary {
        Summary {
            host: self.mean_host(),
            env: self.env,
        }
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Mean host resistance.
    pub host: f64,

    /// Environment resistance.
    pub env: f64,
}
