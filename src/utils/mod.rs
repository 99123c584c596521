//! Internal utility functions for imageops-matte.
//!
//! This module contains common functionality used across different image operations.

use image::{Luma, Pixel, Primitive};
use imageproc::definitions::{Clamp, Image};
use imageproc::map::map_colors;

use crate::error::Error;

/// Rounds a floating-point value to the nearest `u8`, saturating at the ends of the range.
///
/// `imageproc`'s `Clamp` truncates, so the value is rounded first.
#[inline]
pub fn round_to_u8(value: f32) -> u8 {
    <u8 as Clamp<f32>>::clamp(value.round())
}

/// Normalizes an alpha value using a pre-computed max value.
///
/// # Arguments
///
/// * `alpha` - The alpha value to normalize
/// * `max_value` - The pre-computed maximum value for the type
///
/// # Returns
///
/// The normalized alpha value as a floating-point number between 0 and 1
#[inline]
pub fn normalize_alpha_with_max<S>(alpha: S, max_value: f32) -> f32
where
    S: Into<f32> + Primitive,
{
    alpha.into() / max_value
}

/// Converts an 8-bit single channel image to `f32` in the range [0, 1].
pub fn normalize_luma(image: &Image<Luma<u8>>) -> Image<Luma<f32>> {
    let max_value = f32::from(u8::MAX);
    map_colors(image, |Luma([value])| {
        Luma([normalize_alpha_with_max(value, max_value)])
    })
}

/// Converts a normalized `f32` single channel image back to 8 bits, rounding and clamping.
pub fn denormalize_luma(image: &Image<Luma<f32>>) -> Image<Luma<u8>> {
    let max_value = f32::from(u8::MAX);
    map_colors(image, |Luma([value])| Luma([round_to_u8(value * max_value)]))
}

/// Number of pixels in a `width` x `height` raster, computed without `u32` overflow.
#[inline]
pub fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Maps a possibly out-of-range index onto `0..len` by mirroring at the borders.
///
/// The edge sample is repeated (`-1 -> 0`, `len -> len - 1`), and offsets larger than
/// the extent keep bouncing, so any radius works on any non-empty axis.
#[inline]
pub fn reflect_index(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    let period = 2 * len;
    let folded = index.rem_euclid(period);
    let mirrored = if folded < len {
        folded
    } else {
        period - 1 - folded
    };
    mirrored as u32
}

/// Builds a row-major buffer of `width * height * channels` values by calling
/// `fill(x, y, pixel)` for every pixel.
///
/// Rows are filled in parallel when the `rayon` feature is enabled. `fill` only
/// writes its own pixel, so the result does not depend on the schedule.
pub fn fill_pixels<T, F>(width: u32, height: u32, channels: usize, fill: F) -> Vec<T>
where
    T: Copy + Default + Send,
    F: Fn(u32, u32, &mut [T]) + Sync,
{
    let row_len = width as usize * channels;
    let mut buffer = vec![T::default(); row_len * height as usize];
    if row_len == 0 {
        return buffer;
    }

    let fill_row = |(y, row): (usize, &mut [T])| {
        for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            fill(x as u32, y as u32, pixel);
        }
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        buffer.par_chunks_mut(row_len).enumerate().for_each(fill_row);
    }
    #[cfg(not(feature = "rayon"))]
    buffer.chunks_mut(row_len).enumerate().for_each(fill_row);

    buffer
}

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When either dimension is zero
pub const fn validate_non_empty_image(width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        Err(Error::InvalidDimensions { width, height })
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
///
/// # Arguments
///
/// * `expected` - The dimensions of the reference image
/// * `actual` - The dimensions of the image paired with it
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the dimensions differ
pub fn validate_matching_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Validates a pair of images: same size and non-empty.
pub fn validate_pair<P, Q>(reference: &Image<P>, other: &Image<Q>) -> Result<(), Error>
where
    P: Pixel,
    Q: Pixel,
{
    validate_matching_dimensions(reference.dimensions(), other.dimensions())?;
    let (width, height) = reference.dimensions();
    validate_non_empty_image(width, height)
}

/// Validates that a parameter is finite and strictly positive.
pub fn validate_positive(name: &str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be a finite value greater than 0, got {value}"
        )))
    }
}

/// Validates that a parameter is finite and not negative.
pub fn validate_non_negative(name: &str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be a finite value greater than or equal to 0, got {value}"
        )))
    }
}
