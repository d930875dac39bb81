//! Deterministic expansion of one seed raster into a batch of geometric variants.
//!
//! Every call produces [`BATCH_LEN`] rasters in the fixed order
//! `base transform × rotation × mirror`. All transforms are pixel permutations, so each variant
//! has the same pixel count as the seed; 90° rotations swap width and height.

use image::{ImageBuffer, Pixel, imageops};

/// Owned image buffer for pixel type `P`.
pub type Buffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Number of rasters produced by one [`expand`] call.
pub const BATCH_LEN: usize = BaseTransform::ALL.len() * Rotation::ALL.len() * Mirror::ALL.len();

/// Transform applied to the seed before rotation and mirroring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseTransform {
    Identity,
    /// Swap left and right halves, split at column `W/2`.
    HalfSwapHorizontal,
    /// Swap top and bottom halves, split at row `H/2`.
    HalfSwapVertical,
    /// Cyclic shift along the width axis by `W/4`.
    ShiftHorizontal,
    /// Cyclic shift along the height axis by `H/4`.
    ShiftVertical,
}

impl BaseTransform {
    pub const ALL: [Self; 5] = [
        Self::Identity,
        Self::HalfSwapHorizontal,
        Self::HalfSwapVertical,
        Self::ShiftHorizontal,
        Self::ShiftVertical,
    ];

    pub fn apply<P: Pixel + 'static>(self, src: &Buffer<P>) -> Buffer<P> {
        let (w, h) = src.dimensions();
        match self {
            Self::Identity => src.clone(),
            Self::HalfSwapHorizontal => half_swap_horizontal(src),
            Self::HalfSwapVertical => half_swap_vertical(src),
            Self::ShiftHorizontal => roll_columns(src, w - w / 4),
            Self::ShiftVertical => roll_rows(src, h - h / 4),
        }
    }
}

/// Clockwise rotation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rotation {
    Identity,
    Cw90,
    Half,
    Ccw90,
}

impl Rotation {
    pub const ALL: [Self; 4] = [Self::Identity, Self::Cw90, Self::Half, Self::Ccw90];

    pub fn apply<P: Pixel + 'static>(self, src: &Buffer<P>) -> Buffer<P> {
        match self {
            Self::Identity => src.clone(),
            Self::Cw90 => imageops::rotate90(src),
            Self::Half => imageops::rotate180(src),
            Self::Ccw90 => imageops::rotate270(src),
        }
    }

    /// `true` when the rotation swaps width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Cw90 | Self::Ccw90)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mirror {
    Identity,
    Horizontal,
    Vertical,
}

impl Mirror {
    pub const ALL: [Self; 3] = [Self::Identity, Self::Horizontal, Self::Vertical];

    pub fn apply<P: Pixel + 'static>(self, src: &Buffer<P>) -> Buffer<P> {
        match self {
            Self::Identity => src.clone(),
            Self::Horizontal => imageops::flip_horizontal(src),
            Self::Vertical => imageops::flip_vertical(src),
        }
    }
}

/// One position in the expansion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub base: BaseTransform,
    pub rotation: Rotation,
    pub mirror: Mirror,
}

impl VariantSpec {
    pub fn apply<P: Pixel + 'static>(self, src: &Buffer<P>) -> Buffer<P> {
        let base = self.base.apply(src);
        let rotated = self.rotation.apply(&base);
        self.mirror.apply(&rotated)
    }
}

/// All variant specs in batch order.
pub fn variant_specs() -> impl Iterator<Item = VariantSpec> {
    BaseTransform::ALL.into_iter().flat_map(|base| {
        Rotation::ALL.into_iter().flat_map(move |rotation| {
            Mirror::ALL.into_iter().map(move |mirror| VariantSpec {
                base,
                rotation,
                mirror,
            })
        })
    })
}

/// Expand `src` into a batch of [`BATCH_LEN`] variants in [`variant_specs`] order.
///
/// Intermediate base and rotated rasters are shared across the inner loops.
pub fn expand<P: Pixel + 'static>(src: &Buffer<P>) -> Vec<Buffer<P>> {
    let mut out = Vec::with_capacity(BATCH_LEN);
    for base in BaseTransform::ALL {
        let based = base.apply(src);
        for rotation in Rotation::ALL {
            let rotated = rotation.apply(&based);
            for mirror in Mirror::ALL {
                out.push(mirror.apply(&rotated));
            }
        }
    }
    out
}

/// Right half followed by left half. Odd widths leave the extra column in the right half.
pub fn half_swap_horizontal<P: Pixel>(src: &Buffer<P>) -> Buffer<P> {
    roll_columns(src, src.width() / 2)
}

/// Bottom half followed by top half. Odd heights leave the extra row in the bottom half.
pub fn half_swap_vertical<P: Pixel>(src: &Buffer<P>) -> Buffer<P> {
    roll_rows(src, src.height() / 2)
}

/// Output column `x` takes input column `(x + offset) mod W`.
fn roll_columns<P: Pixel>(src: &Buffer<P>, offset: u32) -> Buffer<P> {
    let mut out = src.clone();
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return out;
    }
    let channels = usize::from(P::CHANNEL_COUNT);
    let row_len = w as usize * channels;
    let shift = (offset % w) as usize * channels;
    for row in out.chunks_exact_mut(row_len) {
        row.rotate_left(shift);
    }
    out
}

/// Output row `y` takes input row `(y + offset) mod H`.
fn roll_rows<P: Pixel>(src: &Buffer<P>, offset: u32) -> Buffer<P> {
    let mut out = src.clone();
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 {
        return out;
    }
    let row_len = w as usize * usize::from(P::CHANNEL_COUNT);
    let shift = (offset % h) as usize * row_len;
    out.rotate_left(shift);
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use image::{Luma, Rgb, RgbImage};

    use super::*;

    /// Raster whose pixels are all distinct, so no non-trivial permutation fixes it.
    fn distinct(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let i = y * w + x;
            Rgb([(i & 0xff) as u8, (i >> 8) as u8, 7])
        })
    }

    fn row(values: &[u8]) -> Buffer<Luma<u8>> {
        ImageBuffer::from_raw(values.len() as u32, 1, values.to_vec()).unwrap()
    }

    fn column(values: &[u8]) -> Buffer<Luma<u8>> {
        ImageBuffer::from_raw(1, values.len() as u32, values.to_vec()).unwrap()
    }

    #[test]
    fn batch_has_sixty_variants_with_same_pixel_count() {
        let src = distinct(6, 4);
        let batch = expand(&src);
        assert_eq!(batch.len(), 60);
        assert_eq!(BATCH_LEN, 60);

        for (variant, spec) in batch.iter().zip(variant_specs()) {
            assert_eq!(variant.width() * variant.height(), 24);
            let expected = if spec.rotation.is_quarter_turn() {
                (4, 6)
            } else {
                (6, 4)
            };
            assert_eq!(variant.dimensions(), expected, "{spec:?}");
        }
    }

    #[test]
    fn expand_follows_variant_order() {
        let src = distinct(5, 3);
        let batch = expand(&src);
        let specs: Vec<_> = variant_specs().collect();
        assert_eq!(specs.len(), BATCH_LEN);
        assert_eq!(
            specs[0],
            VariantSpec {
                base: BaseTransform::Identity,
                rotation: Rotation::Identity,
                mirror: Mirror::Identity,
            }
        );
        assert_eq!(
            specs[13],
            VariantSpec {
                base: BaseTransform::HalfSwapHorizontal,
                rotation: Rotation::Identity,
                mirror: Mirror::Horizontal,
            }
        );
        for (variant, spec) in batch.iter().zip(specs) {
            assert_eq!(variant, &spec.apply(&src), "{spec:?}");
        }
        assert_eq!(batch[0], src);
    }

    #[test]
    fn rotation_mirror_block_has_eight_distinct_rasters() {
        // 4 rotations x 3 mirrors cover the 8-element dihedral group, with 4 repeats.
        let src = distinct(4, 3);
        for base in BaseTransform::ALL {
            let based = base.apply(&src);
            let mut seen = HashSet::new();
            for rotation in Rotation::ALL {
                for mirror in Mirror::ALL {
                    let v = mirror.apply(&rotation.apply(&based));
                    seen.insert((v.dimensions(), v.into_raw()));
                }
            }
            assert_eq!(seen.len(), 8, "{base:?}");
        }
    }

    #[test]
    fn half_swap_is_an_involution_on_even_sizes() {
        let src = distinct(8, 6);
        assert_ne!(half_swap_horizontal(&src), src);
        assert_eq!(half_swap_horizontal(&half_swap_horizontal(&src)), src);
        assert_ne!(half_swap_vertical(&src), src);
        assert_eq!(half_swap_vertical(&half_swap_vertical(&src)), src);
    }

    #[test]
    fn odd_half_swap_puts_right_half_first() {
        let swapped = half_swap_horizontal(&row(&[0, 1, 2, 3, 4]));
        assert_eq!(swapped.as_raw(), &vec![2, 3, 4, 0, 1]);

        let swapped = half_swap_vertical(&column(&[0, 1, 2, 3, 4]));
        assert_eq!(swapped.as_raw(), &vec![2, 3, 4, 0, 1]);
    }

    #[test]
    fn cyclic_shift_moves_content_forward_by_a_quarter() {
        let shifted = BaseTransform::ShiftHorizontal.apply(&row(&[0, 1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(shifted.as_raw(), &vec![6, 7, 0, 1, 2, 3, 4, 5]);

        let shifted = BaseTransform::ShiftVertical.apply(&column(&[0, 1, 2, 3, 4]));
        assert_eq!(shifted.as_raw(), &vec![4, 0, 1, 2, 3]);
    }

    #[test]
    fn four_quarter_shifts_restore_the_source() {
        let src = distinct(8, 12);
        let mut h = src.clone();
        let mut v = src.clone();
        for _ in 0..4 {
            h = BaseTransform::ShiftHorizontal.apply(&h);
            v = BaseTransform::ShiftVertical.apply(&v);
        }
        assert_eq!(h, src);
        assert_eq!(v, src);
    }

    #[test]
    fn single_pixel_expands_to_copies() {
        let src = RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]));
        let batch = expand(&src);
        assert_eq!(batch.len(), BATCH_LEN);
        assert!(batch.iter().all(|v| v == &src));
    }

    #[test]
    fn rotations_preserve_pixels_per_row_layout() {
        let src = distinct(3, 2);
        let cw = Rotation::Cw90.apply(&src);
        assert_eq!(cw.dimensions(), (2, 3));
        // Top-left of a clockwise rotation is the source's bottom-left.
        assert_eq!(cw.get_pixel(0, 0), src.get_pixel(0, 1));
        let ccw = Rotation::Ccw90.apply(&src);
        assert_eq!(ccw.get_pixel(0, 0), src.get_pixel(2, 0));
        let mirrored = Mirror::Horizontal.apply(&src);
        assert_eq!(mirrored.get_pixel(0, 0), src.get_pixel(2, 0));
        let flipped = Mirror::Vertical.apply(&src);
        assert_eq!(flipped.get_pixel(0, 0), src.get_pixel(0, 1));
    }
}
