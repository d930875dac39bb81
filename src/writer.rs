use std::{
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

use crate::{
    codec::write_raster,
    foundation::{
        core::{FileIndex, FileNamer, OutputFormat, Raster},
        error::{GenError, GenResult},
    },
};

/// Default number of concurrent encode/write tasks.
pub const DEFAULT_WORKERS: usize = 8;

#[derive(Clone, Debug)]
pub struct WriterOpts {
    /// Worker pool size; must be >= 1.
    pub workers: usize,
    /// Deadline for a whole batch. `None` waits indefinitely.
    pub batch_timeout: Option<Duration>,
}

impl Default for WriterOpts {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_timeout: None,
        }
    }
}

/// Outcome of one fully-awaited batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// File Index assigned to the first raster of the batch.
    pub first_index: u64,
    pub files: u64,
    /// Sum of the sizes of the files written by this batch.
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Encodes and writes batches of rasters on a fixed-size worker pool.
///
/// File names are assigned on the calling thread in submission order; completion order across
/// workers is unspecified. [`BatchWriter::write_batch`] returns only after every task of the
/// batch has reported, which is the sole synchronization barrier of a run.
pub struct BatchWriter {
    pool: rayon::ThreadPool,
    namer: FileNamer,
    format: OutputFormat,
    batch_timeout: Option<Duration>,
}

impl BatchWriter {
    pub fn new(namer: FileNamer, format: OutputFormat, opts: &WriterOpts) -> GenResult<Self> {
        Ok(Self {
            pool: build_thread_pool(opts.workers)?,
            namer,
            format,
            batch_timeout: opts.batch_timeout,
        })
    }

    pub fn namer(&self) -> &FileNamer {
        &self.namer
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submit every raster of `batch`, then block until all of them are written.
    ///
    /// Each raster consumes one value of `index`. If any write fails the remaining tasks are
    /// still awaited and the failure with the lowest index is returned. A batch deadline, when
    /// configured, aborts the wait with [`GenError::Timeout`].
    #[tracing::instrument(skip_all, fields(len = batch.len(), first_index = index.issued()))]
    pub fn write_batch(&self, batch: Vec<Raster>, index: &mut FileIndex) -> GenResult<BatchReport> {
        let started = Instant::now();
        let first_index = index.issued();
        let total = batch.len();
        let (tx, rx) = mpsc::channel::<(u64, GenResult<u64>)>();

        for raster in batch {
            let idx = index.next_index();
            let path = self.namer.path_for(idx);
            let format = self.format;
            let tx = tx.clone();
            self.pool.spawn(move || {
                let result = write_raster(&raster, &path, format);
                drop(raster);
                // The receiver is gone only after a timeout, when nobody needs the result.
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let deadline = self.batch_timeout.map(|t| started + t);
        let mut report = BatchReport {
            first_index,
            ..BatchReport::default()
        };
        let mut failure: Option<(u64, GenError)> = None;

        for received in 0..total {
            let (idx, result) = match deadline {
                Some(deadline) => {
                    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(msg) => msg,
                        Err(RecvTimeoutError::Timeout) => {
                            let outstanding = total - received;
                            return Err(GenError::timeout(format!(
                                "batch at index {first_index}: {outstanding} of {total} writes \
                                 still running after {:?}",
                                self.batch_timeout.unwrap_or_default()
                            )));
                        }
                        Err(RecvTimeoutError::Disconnected) => return Err(worker_lost()),
                    }
                }
                None => rx.recv().map_err(|_| worker_lost())?,
            };

            match result {
                Ok(bytes) => {
                    report.files += 1;
                    report.bytes += bytes;
                }
                Err(err) => {
                    tracing::warn!(index = idx, error = %err, "write failed");
                    if failure.as_ref().is_none_or(|(first, _)| idx < *first) {
                        failure = Some((idx, err));
                    }
                }
            }
        }

        if let Some((_, err)) = failure {
            return Err(err);
        }

        report.elapsed = started.elapsed();
        tracing::debug!(
            files = report.files,
            bytes = report.bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch written"
        );
        Ok(report)
    }
}

fn worker_lost() -> GenError {
    GenError::Other(anyhow::anyhow!(
        "writer worker exited without reporting a result"
    ))
}

fn build_thread_pool(workers: usize) -> GenResult<rayon::ThreadPool> {
    if workers == 0 {
        return Err(GenError::config("writer workers must be >= 1"));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("imagegen-writer-{i}"))
        .build()
        .map_err(|e| GenError::Other(anyhow::anyhow!("failed to build writer thread pool: {e}")))
}
