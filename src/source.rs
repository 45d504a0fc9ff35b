use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Random number generator driving every stochastic draw of a run.
pub type RandomSource = ChaCha12Rng;

/// Create a source from a base seed and a stream index.
///
/// Sources sharing a seed but using different streams produce independent sequences.
pub fn make_source(seed: u64, stream: u64) -> RandomSource {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Draw a fresh base seed from the operating system.
pub fn entropy_seed() -> Result<u64> {
    let mut rng = ChaCha12Rng::try_from_os_rng().context("failed to seed from os rng")?;
    Ok(rng.random())
}
