use std::path::{Path, PathBuf};

use rand::Rng;

use crate::foundation::error::{GenError, GenResult};

/// In-memory RGB8 raster. Every seed and variant flows through the crate in this form.
pub type Raster = image::RgbImage;

/// Bytes per GiB; `--target-gb` is interpreted in binary units.
pub const GIB: u64 = 1 << 30;

/// Zero-padding width of the File Index inside generated file names.
pub const INDEX_WIDTH: usize = 7;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Encoding used for every file written during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossy JPEG with a quality in `1..=100`.
    Jpg { quality: u8 },
    /// Lossless PNG.
    Png,
    /// Lossless WebP. Quality is ignored.
    Webp,
}

impl OutputFormat {
    /// Validated JPEG format.
    pub fn jpg(quality: u8) -> GenResult<Self> {
        if !(1..=100).contains(&quality) {
            return Err(GenError::config(format!(
                "jpg quality must be in 1..=100, got {quality}"
            )));
        }
        Ok(Self::Jpg { quality })
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg { .. } => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpg { .. })
    }
}

/// Run-wide counter that hands out one gap-free index per written file.
///
/// Owned by the driver and passed by `&mut` into each batch submission, so indices are assigned
/// in submission order on a single thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileIndex(u64);

impl FileIndex {
    pub fn new() -> Self {
        Self(0)
    }

    /// Return the current value and advance by exactly one.
    pub fn next_index(&mut self) -> u64 {
        let idx = self.0;
        self.0 += 1;
        idx
    }

    /// Number of indices handed out so far.
    pub fn issued(self) -> u64 {
        self.0
    }
}

/// Builds output paths of the form `<dir>/<prefix>-<index:07>.<ext>`.
#[derive(Clone, Debug)]
pub struct FileNamer {
    dir: PathBuf,
    prefix: String,
    extension: &'static str,
}

impl FileNamer {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: format.extension(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!(
            "{}-{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = INDEX_WIDTH
        ))
    }
}

/// `len` random characters from `[a-z0-9]`.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Run-scoped prefix `<base>-<token>` so that repeated runs into one directory never collide.
pub fn run_prefix<R: Rng + ?Sized>(base: &str, rng: &mut R) -> String {
    format!("{base}-{}", random_token(rng, 8))
}

/// Convert a size in GiB into a byte budget.
///
/// Non-positive sizes map to 0 (no work). The result is rounded up so that
/// `size >= target_bytes` holds exactly when `size >= gb * 2^30`.
pub fn target_bytes_from_gb(gb: f64) -> GenResult<u64> {
    if !gb.is_finite() {
        return Err(GenError::config(format!("target size must be finite, got {gb}")));
    }
    if gb <= 0.0 {
        return Ok(0);
    }
    let bytes = (gb * GIB as f64).ceil();
    if bytes >= u64::MAX as f64 {
        return Err(GenError::config(format!("target size {gb} GiB is too large")));
    }
    Ok(bytes as u64)
}
