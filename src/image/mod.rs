//! The image-domain analogue of sampling and quantization.
//!
//! - [`resolution`]: spatial sampling. Fewer pixels, scaled back up with
//!   nearest-neighbor so the blocks stay visible.
//! - [`palette`]: color quantization. A median-cut palette and a
//!   nearest-color remap.
//!
//! Images are [`ImageGrid`]s: a `height × width` grid stored either as full
//! color or as palette indices. Fetching and decoding images is the caller's job.

pub mod palette;
pub mod resolution;

pub use palette::{MAX_PALETTE_COLORS, median_cut_palette, quantize_to_palette, reduce_colors};
pub use resolution::{reduce_resolution, reduced_dimensions, resize_nearest};

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{DigitizerError, DigitizerResult};

/// An 8-bit-per-channel RGB color.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Black.
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    /// White.
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    /// Squared euclidean distance in RGB space.
    pub fn distance_squared(self, other: Rgb) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(&a, &b)| {
                let d = u32::from(a.abs_diff(b));
                d * d
            })
            .sum()
    }
}

/// Pixel storage of an [`ImageGrid`]. Arrays are indexed `[[y, x]]`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Full-color pixels.
    Rgb(Array2<Rgb>),
    /// Palette indices plus the palette they point into.
    Indexed {
        /// Index into `palette` per pixel.
        indices: Array2<u16>,
        /// The colors.
        palette: Vec<Rgb>,
    },
}

/// A non-empty 2-D grid of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid {
    data: ImageData,
}

fn check_not_empty(height: usize, width: usize) -> DigitizerResult<()> {
    if height == 0 || width == 0 {
        return Err(DigitizerError::invalid_parameter(
            "image",
            format!("must have at least one pixel, got {width}x{height}"),
        ));
    }
    Ok(())
}

impl ImageGrid {
    /// Wraps a full-color pixel array of shape `(height, width)`.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if the array has no pixels.
    pub fn from_pixels(pixels: Array2<Rgb>) -> DigitizerResult<Self> {
        check_not_empty(pixels.nrows(), pixels.ncols())?;
        Ok(Self {
            data: ImageData::Rgb(pixels),
        })
    }

    /// Builds a full-color image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Errors
    /// [`DigitizerError::InvalidParameter`] if either dimension is zero.
    pub fn from_fn<G>(width: usize, height: usize, mut f: G) -> DigitizerResult<Self>
    where
        G: FnMut(usize, usize) -> Rgb,
    {
        check_not_empty(height, width)?;
        Self::from_pixels(Array2::from_shape_fn((height, width), |(y, x)| f(x, y)))
    }

    /// Reads row-major, interleaved RGB8 bytes (`width · height · 3` of them).
    ///
    /// # Errors
    /// - [`DigitizerError::InvalidParameter`] if either dimension is zero.
    /// - [`DigitizerError::DimensionMismatch`] if the byte count is wrong.
    pub fn from_raw_rgb(width: usize, height: usize, bytes: &[u8]) -> DigitizerResult<Self> {
        check_not_empty(height, width)?;
        let expected = width * height * 3;
        if bytes.len() != expected {
            return Err(DigitizerError::DimensionMismatch(format!(
                "{width}x{height} RGB image needs {expected} bytes, got {}",
                bytes.len()
            )));
        }

        let pixels: Vec<Rgb> = bytes
            .chunks_exact(3)
            .map(|c| Rgb([c[0], c[1], c[2]]))
            .collect();
        let pixels = Array2::from_shape_vec((height, width), pixels)
            .map_err(|e| DigitizerError::DimensionMismatch(e.to_string()))?;
        Self::from_pixels(pixels)
    }

    /// Wraps palette indices of shape `(height, width)` and their palette.
    ///
    /// # Errors
    /// - [`DigitizerError::InvalidParameter`] if the grid is empty.
    /// - [`DigitizerError::DimensionMismatch`] if an index points past the palette.
    pub fn from_indexed(indices: Array2<u16>, palette: Vec<Rgb>) -> DigitizerResult<Self> {
        check_not_empty(indices.nrows(), indices.ncols())?;
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= palette.len()) {
            return Err(DigitizerError::DimensionMismatch(format!(
                "palette index {bad} out of bounds for a palette of {} colors",
                palette.len()
            )));
        }
        Ok(Self {
            data: ImageData::Indexed { indices, palette },
        })
    }

    /// The underlying storage.
    pub const fn data(&self) -> &ImageData {
        &self.data
    }

    fn shape(&self) -> (usize, usize) {
        match &self.data {
            ImageData::Rgb(pixels) => pixels.dim(),
            ImageData::Indexed { indices, .. } => indices.dim(),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Returns true if pixels are stored as palette indices.
    pub const fn is_indexed(&self) -> bool {
        matches!(self.data, ImageData::Indexed { .. })
    }

    /// The palette of an indexed image.
    pub fn palette(&self) -> Option<&[Rgb]> {
        match &self.data {
            ImageData::Rgb(_) => None,
            ImageData::Indexed { palette, .. } => Some(palette),
        }
    }

    /// Color at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        match &self.data {
            ImageData::Rgb(pixels) => pixels.get((y, x)).copied(),
            ImageData::Indexed { indices, palette } => indices
                .get((y, x))
                .and_then(|&i| palette.get(usize::from(i)))
                .copied(),
        }
    }

    /// Full-color pixels, resolving palette indices if needed.
    pub fn to_pixels(&self) -> Array2<Rgb> {
        match &self.data {
            ImageData::Rgb(pixels) => pixels.clone(),
            ImageData::Indexed { indices, palette } => {
                indices.mapv(|i| palette[usize::from(i)])
            }
        }
    }

    /// A full-color copy of this image (de-palettized if indexed).
    pub fn to_rgb(&self) -> ImageGrid {
        ImageGrid {
            data: ImageData::Rgb(self.to_pixels()),
        }
    }

    /// Row-major, interleaved RGB8 bytes.
    pub fn to_raw_rgb(&self) -> Vec<u8> {
        self.to_pixels().iter().flat_map(|p| p.0).collect()
    }

    /// Number of distinct colors actually used.
    pub fn distinct_colors(&self) -> usize {
        self.to_pixels().iter().copied().collect::<BTreeSet<Rgb>>().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_raw_rgb_layout() {
        let bytes = [255, 0, 0, 0, 255, 0, 0, 0, 255, 9, 9, 9];
        let image = ImageGrid::from_raw_rgb(2, 2, &bytes).unwrap();

        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.pixel(1, 0), Some(Rgb::new(0, 255, 0)));
        assert_eq!(image.pixel(0, 1), Some(Rgb::new(0, 0, 255)));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.to_raw_rgb(), bytes.to_vec());
    }

    #[test]
    fn test_raw_rgb_rejects_wrong_sizes() {
        assert!(matches!(
            ImageGrid::from_raw_rgb(2, 2, &[0; 11]),
            Err(DigitizerError::DimensionMismatch(_))
        ));
        assert!(ImageGrid::from_raw_rgb(0, 2, &[]).is_err());
    }

    #[test]
    fn test_indexed_image_depalettizes() {
        let palette = vec![Rgb::BLACK, Rgb::WHITE];
        let image = ImageGrid::from_indexed(array![[0u16, 1], [1, 0]], palette.clone()).unwrap();

        assert!(image.is_indexed());
        assert_eq!(image.palette(), Some(palette.as_slice()));
        assert_eq!(image.pixel(1, 0), Some(Rgb::WHITE));

        let rgb = image.to_rgb();
        assert!(!rgb.is_indexed());
        assert_eq!(rgb.to_pixels(), array![[Rgb::BLACK, Rgb::WHITE], [Rgb::WHITE, Rgb::BLACK]]);
        assert_eq!(rgb.distinct_colors(), 2);
    }

    #[test]
    fn test_indexed_image_rejects_bad_index() {
        let result = ImageGrid::from_indexed(array![[0u16, 2]], vec![Rgb::BLACK, Rgb::WHITE]);
        assert!(result.is_err());
    }

    #[test]
    fn test_distance_squared() {
        assert_eq!(Rgb::BLACK.distance_squared(Rgb::WHITE), 3 * 255 * 255);
        assert_eq!(Rgb::new(10, 20, 30).distance_squared(Rgb::new(13, 16, 30)), 25);
    }
}
