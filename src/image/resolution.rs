//! Spatial sampling of images with nearest-neighbor resizing.
//!
//! No interpolation happens anywhere in this module. Each output pixel copies
//! the source pixel whose center is closest to its own:
//! `src = floor((dst + 0.5) · src_len / dst_len)`.

use ndarray::Array2;
use tracing::debug;

use super::{ImageData, ImageGrid};
use crate::{DigitizerError, DigitizerResult};

fn nearest_source(dst: usize, src_len: usize, dst_len: usize) -> usize {
    ((2 * dst + 1) * src_len / (2 * dst_len)).min(src_len - 1)
}

fn resize_array<T: Clone>(src: &Array2<T>, width: usize, height: usize) -> Array2<T> {
    let (src_height, src_width) = src.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        src[[
            nearest_source(y, src_height, height),
            nearest_source(x, src_width, width),
        ]]
        .clone()
    })
}

/// Size of an image scaled to `percent` % of `(width, height)`.
///
/// Each side is `floor(side · percent / 100)`, but never less than one pixel.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if `percent` is outside `[1, 100]`.
pub fn reduced_dimensions(
    width: usize,
    height: usize,
    percent: u32,
) -> DigitizerResult<(usize, usize)> {
    if !(1..=100).contains(&percent) {
        return Err(DigitizerError::invalid_parameter(
            "resolution_percent",
            format!("must be in [1, 100], got {percent}"),
        ));
    }
    let percent = percent as usize;
    Ok((
        (width * percent / 100).max(1),
        (height * percent / 100).max(1),
    ))
}

/// Resizes `image` to `width × height` with nearest-neighbor sampling.
///
/// Palette-indexed images stay indexed and keep their palette.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if either target dimension is zero.
pub fn resize_nearest(
    image: &ImageGrid,
    width: usize,
    height: usize,
) -> DigitizerResult<ImageGrid> {
    if width == 0 || height == 0 {
        return Err(DigitizerError::invalid_parameter(
            "dimensions",
            format!("target size must be at least 1x1, got {width}x{height}"),
        ));
    }

    match image.data() {
        ImageData::Rgb(pixels) => ImageGrid::from_pixels(resize_array(pixels, width, height)),
        ImageData::Indexed { indices, palette } => {
            ImageGrid::from_indexed(resize_array(indices, width, height), palette.clone())
        }
    }
}

/// Pixelates `image`: keeps `percent` % of its resolution, then scales it back
/// to the original size so the lost detail shows as blocks.
///
/// Both steps are nearest-neighbor. `percent == 100` returns an identical image.
///
/// # Errors
/// [`DigitizerError::InvalidParameter`] if `percent` is outside `[1, 100]`.
pub fn reduce_resolution(image: &ImageGrid, percent: u32) -> DigitizerResult<ImageGrid> {
    let (width, height) = image.dimensions();
    let (reduced_width, reduced_height) = reduced_dimensions(width, height, percent)?;

    let reduced = resize_nearest(image, reduced_width, reduced_height)?;
    let restored = resize_nearest(&reduced, width, height)?;

    debug!(
        percent,
        width, height, reduced_width, reduced_height, "reduced image resolution"
    );
    Ok(restored)
}
