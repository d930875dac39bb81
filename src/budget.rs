//! Disk-budget driver: expand, write, re-measure, until the output directory is big enough.

use std::{io::Write as _, path::Path};

use crate::{
    foundation::{
        core::{FileIndex, Raster},
        error::{GenError, GenResult},
    },
    probe::dir_size,
    variants::expand,
    writer::BatchWriter,
};

/// State of the budget loop. `Done` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Done,
}

/// Snapshot emitted after every completed batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// 1-based batch number.
    pub batch: u64,
    pub current_bytes: u64,
    pub target_bytes: u64,
    pub files_written: u64,
}

impl Progress {
    /// Fraction of the budget reached, capped at 1.0.
    pub fn fraction(&self) -> f64 {
        if self.target_bytes == 0 {
            return 1.0;
        }
        (self.current_bytes as f64 / self.target_bytes as f64).min(1.0)
    }
}

pub trait ProgressReporter {
    fn report(&mut self, progress: &Progress);
}

/// Prints one human-readable line per batch to stdout.
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl ProgressReporter for StdoutProgress {
    fn report(&mut self, p: &Progress) {
        let mut out = std::io::stdout().lock();
        // Progress output is best-effort; a closed stdout must not abort generation.
        let _ = writeln!(
            out,
            "progress: {}/{} bytes ({:.1}%) after batch {} [{} files]",
            p.current_bytes,
            p.target_bytes,
            p.fraction() * 100.0,
            p.batch,
            p.files_written
        );
    }
}

/// Keeps every report in memory; used by tests and embedders.
#[derive(Debug, Default)]
pub struct InMemoryProgress {
    pub reports: Vec<Progress>,
}

impl ProgressReporter for InMemoryProgress {
    fn report(&mut self, progress: &Progress) {
        self.reports.push(*progress);
    }
}

/// Totals for a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    pub files_written: u64,
    /// Number of directory size probes performed.
    pub probes: u64,
    pub final_bytes: u64,
}

/// Create `dir` and its parents if absent.
pub fn prepare_output_dir(dir: &Path) -> GenResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| GenError::io(dir, e))
}

/// Two-state driver that grows the writer's output directory until it holds `target_bytes`.
///
/// The directory is only probed between batches, never while writes are in flight. The probe
/// taken after a batch is reused as the measurement for the next transition, so a run of `n`
/// batches performs `n + 1` probes.
pub struct BudgetLoop<'a> {
    source: &'a Raster,
    writer: &'a BatchWriter,
    target_bytes: u64,
    index: FileIndex,
    state: LoopState,
    measured: Option<u64>,
    summary: RunSummary,
}

impl<'a> BudgetLoop<'a> {
    pub fn new(source: &'a Raster, writer: &'a BatchWriter, target_bytes: u64) -> Self {
        Self {
            source,
            writer,
            target_bytes,
            index: FileIndex::new(),
            state: LoopState::Running,
            measured: None,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    fn probe(&mut self) -> GenResult<u64> {
        let bytes = dir_size(self.writer.namer().dir())?;
        self.summary.probes += 1;
        self.summary.final_bytes = bytes;
        Ok(bytes)
    }

    /// Perform one transition. Calling `step` in `Done` is a no-op.
    pub fn step(&mut self, reporter: &mut dyn ProgressReporter) -> GenResult<LoopState> {
        if self.state == LoopState::Done {
            return Ok(LoopState::Done);
        }

        let current = match self.measured.take() {
            Some(bytes) => bytes,
            None => self.probe()?,
        };
        if current >= self.target_bytes {
            tracing::info!(
                current_bytes = current,
                target_bytes = self.target_bytes,
                "budget reached"
            );
            self.state = LoopState::Done;
            return Ok(self.state);
        }

        let batch = expand(self.source);
        let report = self.writer.write_batch(batch, &mut self.index)?;
        self.summary.batches += 1;
        self.summary.files_written += report.files;

        let after = self.probe()?;
        self.measured = Some(after);
        tracing::info!(
            batch = self.summary.batches,
            files = report.files,
            batch_bytes = report.bytes,
            current_bytes = after,
            target_bytes = self.target_bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch complete"
        );
        reporter.report(&Progress {
            batch: self.summary.batches,
            current_bytes: after,
            target_bytes: self.target_bytes,
            files_written: self.summary.files_written,
        });
        Ok(self.state)
    }

    /// Step until `Done` and return the run totals. The first error aborts the run.
    pub fn run(mut self, reporter: &mut dyn ProgressReporter) -> GenResult<RunSummary> {
        while self.step(reporter)? == LoopState::Running {}
        Ok(self.summary)
    }
}
