//! Synthetic image fixtures for download-pipeline tests.
//!
//! Two generators are provided:
//!
//! - **Noise** ([`generate_noise`]): uniform random rasters at fixed sizes and counts.
//! - **Budget fill** ([`BudgetLoop`]): expands one seed image into [`BATCH_LEN`] geometric
//!   variants per batch and writes them on a bounded worker pool until the output directory
//!   reaches a target size.
//!
//! All output is a local filesystem side effect; nothing is read back except file sizes.
#![forbid(unsafe_code)]

mod foundation;

pub mod budget;
pub mod codec;
pub mod noise;
pub mod probe;
pub mod variants;
pub mod writer;

pub use budget::{
    BudgetLoop, InMemoryProgress, LoopState, Progress, ProgressReporter, RunSummary,
    StdoutProgress, prepare_output_dir,
};
pub use codec::{encode_into, load_seed, write_raster};
pub use foundation::core::{
    FileIndex, FileNamer, GIB, INDEX_WIDTH, OutputFormat, Raster, random_token, run_prefix,
    target_bytes_from_gb,
};
pub use foundation::error::{GenError, GenResult};
pub use noise::{NoiseOpts, create_noise_image, generate_noise, parse_sizes};
pub use probe::dir_size;
pub use variants::{
    BATCH_LEN, BaseTransform, Mirror, Rotation, VariantSpec, expand, variant_specs,
};
pub use writer::{BatchReport, BatchWriter, DEFAULT_WORKERS, WriterOpts};
