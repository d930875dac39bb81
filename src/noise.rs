//! Uniform-noise images at fixed sizes, the simplest way to fill a download fixture directory.

use std::path::PathBuf;

use rand::{Rng, RngCore};

use crate::{
    budget::prepare_output_dir,
    codec::write_raster,
    foundation::{
        core::{OutputFormat, Raster, random_token},
        error::{GenError, GenResult},
    },
};

#[derive(Clone, Debug)]
pub struct NoiseOpts {
    pub out_dir: PathBuf,
    /// Images per size.
    pub count: u32,
    /// `(width, height)` pairs, each producing `count` images.
    pub sizes: Vec<(u32, u32)>,
    pub format: OutputFormat,
    pub prefix: String,
}

impl Default for NoiseOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("web/images"),
            count: 8,
            sizes: vec![(3000, 2000)],
            format: OutputFormat::Jpg { quality: 85 },
            prefix: "img".to_string(),
        }
    }
}

/// Parse a comma-separated size list such as `1024x1024,2000x1200`.
///
/// Empty entries are skipped, so `""` yields an empty list.
pub fn parse_sizes(list: &str) -> GenResult<Vec<(u32, u32)>> {
    let mut sizes = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let lower = part.to_ascii_lowercase();
        let Some((w, h)) = lower.split_once('x') else {
            return Err(GenError::config(format!("invalid size spec: {part}")));
        };
        let parse = |s: &str| -> GenResult<u32> {
            match s.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(GenError::config(format!("invalid size spec: {part}"))),
                Ok(v) => Ok(v),
            }
        };
        sizes.push((parse(w)?, parse(h)?));
    }
    Ok(sizes)
}

/// RGB raster of independent uniformly random bytes.
pub fn create_noise_image<R: RngCore + ?Sized>(width: u32, height: u32, rng: &mut R) -> Raster {
    let mut raster = Raster::new(width, height);
    rng.fill_bytes(&mut raster);
    raster
}

/// Write `count` noise images per size into `opts.out_dir` and return their paths in order.
///
/// Files are named `<prefix>-<w>x<h>-<token>.<ext>`.
#[tracing::instrument(skip(rng), fields(out_dir = %opts.out_dir.display()))]
pub fn generate_noise<R: Rng + ?Sized>(opts: &NoiseOpts, rng: &mut R) -> GenResult<Vec<PathBuf>> {
    prepare_output_dir(&opts.out_dir)?;
    let ext = opts.format.extension();
    let mut written = Vec::with_capacity(opts.sizes.len() * opts.count as usize);

    for &(w, h) in &opts.sizes {
        for _ in 0..opts.count {
            let raster = create_noise_image(w, h, rng);
            let name = format!("{}-{w}x{h}-{}.{ext}", opts.prefix, random_token(rng, 8));
            let path = opts.out_dir.join(name);
            write_raster(&raster, &path, opts.format)?;
            written.push(path);
        }
    }

    tracing::info!(files = written.len(), "noise images written");
    Ok(written)
}
