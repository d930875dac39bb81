use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
};

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
};

use crate::foundation::{
    core::{OutputFormat, Raster},
    error::{GenError, GenResult},
};

/// Decode the seed image at `path` into an RGB8 raster.
#[tracing::instrument]
pub fn load_seed(path: &Path) -> GenResult<Raster> {
    let img = image::open(path)
        .map_err(|e| GenError::input(format!("load seed '{}': {e}", path.display())))?;
    let raster = img.to_rgb8();
    if raster.width() == 0 || raster.height() == 0 {
        return Err(GenError::input(format!(
            "seed '{}' has no pixels",
            path.display()
        )));
    }
    tracing::info!(
        width = raster.width(),
        height = raster.height(),
        "loaded seed image"
    );
    Ok(raster)
}

/// Encode `raster` into `w` using `format`.
pub fn encode_into<W: Write>(
    raster: &Raster,
    w: W,
    format: OutputFormat,
) -> image::ImageResult<()> {
    let (width, height) = raster.dimensions();
    let buf = raster.as_raw();
    match format {
        OutputFormat::Jpg { quality } => JpegEncoder::new_with_quality(w, quality).write_image(
            buf,
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        OutputFormat::Png => {
            PngEncoder::new(w).write_image(buf, width, height, ExtendedColorType::Rgb8)
        }
        OutputFormat::Webp => {
            WebPEncoder::new_lossless(w).write_image(buf, width, height, ExtendedColorType::Rgb8)
        }
    }
}

/// Encode `raster` into a new file at `path` and return the file's size in bytes.
///
/// Fails if `path` already exists; output files are never overwritten.
pub fn write_raster(raster: &Raster, path: &Path, format: OutputFormat) -> GenResult<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| GenError::encode(path, e))?;
    let mut w = BufWriter::new(file);
    encode_into(raster, &mut w, format).map_err(|e| GenError::encode(path, e))?;
    let file = w
        .into_inner()
        .map_err(|e| GenError::encode(path, e.into_error()))?;
    let len = file
        .metadata()
        .map_err(|e| GenError::encode(path, e))?
        .len();
    tracing::debug!(path = %path.display(), bytes = len, "wrote file");
    Ok(len)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn gradient(w: u32, h: u32) -> Raster {
        Raster::from_fn(w, h, |x, y| {
            Rgb([(x * 17 % 256) as u8, (y * 31 % 256) as u8, ((x ^ y) % 256) as u8])
        })
    }

    #[test]
    fn png_and_webp_round_trip_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        let src = gradient(7, 5);
        for (name, format) in [("a.png", OutputFormat::Png), ("a.webp", OutputFormat::Webp)] {
            let path = tmp.path().join(name);
            let len = write_raster(&src, &path, format).unwrap();
            assert_eq!(len, std::fs::metadata(&path).unwrap().len());
            let back = image::open(&path).unwrap().to_rgb8();
            assert_eq!(back, src, "{name}");
        }
    }

    #[test]
    fn jpg_decodes_with_same_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.jpg");
        write_raster(&gradient(9, 4), &path, OutputFormat::Jpg { quality: 85 }).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (9, 4));
    }

    #[test]
    fn jpg_quality_changes_output_size() {
        let src = gradient(64, 64);
        let mut low = Vec::new();
        let mut high = Vec::new();
        encode_into(&src, &mut low, OutputFormat::Jpg { quality: 5 }).unwrap();
        encode_into(&src, &mut high, OutputFormat::Jpg { quality: 100 }).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("taken.png");
        std::fs::write(&path, b"keep").unwrap();
        let err = write_raster(&gradient(2, 2), &path, OutputFormat::Png).unwrap_err();
        assert!(matches!(err, GenError::Encode { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn seed_load_failures_are_input_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = load_seed(&tmp.path().join("missing.png")).unwrap_err();
        assert!(matches!(missing, GenError::Input(_)));

        let garbage = tmp.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let corrupt = load_seed(&garbage).unwrap_err();
        assert!(matches!(corrupt, GenError::Input(_)));
    }

    #[test]
    fn seed_is_converted_to_rgb8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seed.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 128]))
            .save(&path)
            .unwrap();
        let seed = load_seed(&path).unwrap();
        assert_eq!(seed.dimensions(), (3, 2));
        assert_eq!(seed.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }
}
