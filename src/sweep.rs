use crate::config::{Coefficients, Config};
use crate::engine::Engine;
use crate::model::Summary;
use crate::params::ParameterSet;
use crate::source::make_source;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde_value::Value;
use std::{
    io::Write,
    sync::atomic::{AtomicUsize, Ordering},
};

/// One point of a parameter sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Position in grid order, also used as the random stream of the point.
    pub index: usize,
    /// Value of each swept parameter, in axis order.
    pub values: Vec<f64>,
    pub coefs: Coefficients,
}

/// Enumerate the cartesian product of the sweep axes, first axis varying slowest.
///
/// Without axes the grid is the single configured point.
pub fn grid(cfg: &Config) -> Result<Vec<SweepPoint>> {
    let names: Vec<_> = cfg.sweep.iter().map(|axis| axis.param.clone()).collect();
    let mut axes = Vec::with_capacity(cfg.sweep.len());
    for axis in &cfg.sweep {
        axes.push(
            axis.points()
                .with_context(|| format!("invalid sweep axis {:?}", axis.param))?,
        );
    }

    let n_points: usize = axes.iter().map(Vec::len).product();
    let mut points = Vec::with_capacity(n_points);
    for index in 0..n_points {
        let mut values = vec![0.0; axes.len()];
        let mut rem = index;
        for (i_axis, axis) in axes.iter().enumerate().rev() {
            values[i_axis] = axis[rem % axis.len()];
            rem /= axis.len();
        }

        let coefs = substitute(&cfg.coefs, &names, &values)
            .with_context(|| format!("failed to build sweep point {index}"))?;
        points.push(SweepPoint {
            index,
            values,
            coefs,
        });
    }

    Ok(points)
}

/// Replace the named coefficients by `values`.
fn substitute(coefs: &Coefficients, names: &[String], values: &[f64]) -> Result<Coefficients> {
    let mut value = serde_value::to_value(coefs).context("failed to serialize coefficients")?;
    let Value::Map(map) = &mut value else {
        bail!("coefficients must serialize to a map");
    };
    for (name, &val) in names.iter().zip(values) {
        let slot = map
            .get_mut(&Value::String(name.clone()))
            .with_context(|| format!("unknown coefficient {name:?}"))?;
        *slot = Value::F64(val);
    }
    value
        .deserialize_into()
        .context("failed to deserialize coefficients")
}

/// Run a single sweep point to completion.
pub fn run_point(cfg: &Config, point: &SweepPoint, seed: u64) -> Result<Summary> {
    let params = ParameterSet::new(cfg, &point.coefs).context("failed to construct params")?;
    let rng = make_source(seed, point.index as u64);
    let mut engine = Engine::new(params, rng).context("failed to construct engine")?;
    engine.run(None)
}

/// Run every sweep point and write one tab-separated row per point.
///
/// Points whose parameters are invalid are logged and skipped.
pub fn perform_sweep<W: Write>(cfg: &Config, seed: u64, mut writer: W) -> Result<()> {
    let points = grid(cfg).context("failed to build sweep grid")?;
    let n_points = points.len();
    log::info!("sweeping {n_points} points");

    let n_done = AtomicUsize::new(0);
    let results: Vec<_> = points
        .par_iter()
        .map(|point| {
            let result = run_point(cfg, point, seed);
            let n_done = n_done.fetch_add(1, Ordering::Relaxed) + 1;
            let progress = 100.0 * n_done as f64 / n_points as f64;
            log::info!("completed {progress:06.2}%");
            result
        })
        .collect();

    let mut header: Vec<_> = cfg.sweep.iter().map(|axis| axis.param.as_str()).collect();
    header.extend(["host", "env"]);
    writeln!(writer, "{}", header.join("\t")).context("failed to write header")?;

    for (point, result) in points.iter().zip(results) {
        let summary = match result {
            Ok(summary) => summary,
            Err(error) => {
                log::error!("skipped point {} {:?}: {error:#}", point.index, point.values);
                continue;
            }
        };
        let mut row: Vec<_> = point.values.iter().map(|val| val.to_string()).collect();
        row.push(summary.host.to_string());
        row.push(summary.env.to_string());
        writeln!(writer, "{}", row.join("\t")).context("failed to write row")?;
    }

    writer.flush().context("failed to flush writer stream")?;

    Ok(())
}
