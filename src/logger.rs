use crate::model::Summary;
use anyhow::{Context, Result};
use std::io::Write;

/// Receiver of the periodic trajectory records of a run.
pub trait Logger {
    /// Called once before the first record.
    fn header(&mut self) -> Result<()>;

    /// Called after `generation` generations have been completed.
    fn record(&mut self, generation: usize, summary: &Summary) -> Result<()>;
}

/// Writes trajectory records as tab-separated rows.
pub struct TsvLogger<W: Write> {
    writer: W,
}

impl<W: Write> TsvLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().context("failed to flush writer stream")?;
        Ok(self.writer)
    }
}

impl<W: Write> Logger for TsvLogger<W> {
    fn header(&mut self) -> Result<()> {
        writeln!(self.writer, "generation\thost\tenv").context("failed to write header")?;
        Ok(())
    }

    fn record(&mut self, generation: usize, summary: &Summary) -> Result<()> {
        writeln!(self.writer, "{generation}\t{}\t{}", summary.host, summary.env)
            .context("failed to write record")?;
        Ok(())
    }
}
