//! Global brightness, contrast and sharpness gains.
//!
//! Each gain blends the image with a degenerate version of itself:
//! `out = degenerate + gain * (image - degenerate)`. The degenerate image is black for
//! brightness, the mean gray level for contrast and a 3x3 smoothed copy for sharpness.
//! A gain of 1.0 is skipped entirely, so neutral gains never touch a pixel.

use image::{ImageBuffer, Rgb};
use imageproc::definitions::Image;
use imageproc::map::map_colors;

use crate::error::Error;
use crate::imageops_matte::params::ToneGains;
use crate::utils::{round_to_u8, validate_non_empty_image};

/// Centre weight of the smoothing kernel; the eight neighbours weigh 1
const SMOOTH_CENTER_WEIGHT: u32 = 5;
const SMOOTH_TOTAL_WEIGHT: u32 = 13;

/// Trait for applying [`ToneGains`] to an RGB image
pub trait ToneAdjustExt {
    /// Applies brightness, then contrast, then sharpness
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image is empty
    fn adjust_tone(&self, gains: &ToneGains) -> Result<Image<Rgb<u8>>, Error>;
}

impl ToneAdjustExt for Image<Rgb<u8>> {
    fn adjust_tone(&self, gains: &ToneGains) -> Result<Image<Rgb<u8>>, Error> {
        adjust_tone(self, gains)
    }
}

/// Applies brightness, then contrast, then sharpness gains
///
/// This is cheap compared with the adaptive stages of [`preprocess`](crate::preprocess),
/// which makes it suitable for interactive tuning on an already enhanced image.
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
pub fn adjust_tone(image: &Image<Rgb<u8>>, gains: &ToneGains) -> Result<Image<Rgb<u8>>, Error> {
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;

    let mut adjusted = image.clone();
    if gains.brightness() != 1.0 {
        adjusted = scale_brightness(&adjusted, gains.brightness());
    }
    if gains.contrast() != 1.0 {
        adjusted = scale_contrast(&adjusted, gains.contrast());
    }
    if gains.sharpness() != 1.0 {
        adjusted = scale_sharpness(&adjusted, gains.sharpness());
    }
    Ok(adjusted)
}

#[inline]
fn blend(degenerate: f32, value: u8, gain: f32) -> u8 {
    round_to_u8(gain.mul_add(f32::from(value) - degenerate, degenerate))
}

fn scale_brightness(image: &Image<Rgb<u8>>, gain: f32) -> Image<Rgb<u8>> {
    map_colors(image, |Rgb(channels)| Rgb(channels.map(|v| blend(0.0, v, gain))))
}

fn scale_contrast(image: &Image<Rgb<u8>>, gain: f32) -> Image<Rgb<u8>> {
    let mean = f32::from(mean_gray_level(image));
    map_colors(image, |Rgb(channels)| Rgb(channels.map(|v| blend(mean, v, gain))))
}

fn scale_sharpness(image: &Image<Rgb<u8>>, gain: f32) -> Image<Rgb<u8>> {
    let smoothed = smooth(image);
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let Rgb(original) = *image.get_pixel(x, y);
        let Rgb(degenerate) = *smoothed.get_pixel(x, y);
        Rgb(std::array::from_fn(|c| {
            blend(f32::from(degenerate[c]), original[c], gain)
        }))
    })
}

/// Rounded mean of the Rec. 601 luma of the image
fn mean_gray_level(image: &Image<Rgb<u8>>) -> u8 {
    let total: u64 = image
        .pixels()
        .map(|&Rgb([r, g, b])| {
            let luma = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
            u64::from(luma)
        })
        .sum();
    let count = u64::from(image.width()) * u64::from(image.height());
    ((total + count / 2) / count) as u8
}

/// 3x3 smoothing with weights `[1 1 1; 1 5 1; 1 1 1] / 13`; the one pixel border is
/// copied unchanged
fn smooth(image: &Image<Rgb<u8>>) -> Image<Rgb<u8>> {
    let (width, height) = image.dimensions();
    let mut smoothed = image.clone();
    if width < 3 || height < 3 {
        return smoothed;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0u32; 3];
            for (dx, dy) in itertools::iproduct!(0..3u32, 0..3u32) {
                let weight = if dx == 1 && dy == 1 {
                    SMOOTH_CENTER_WEIGHT
                } else {
                    1
                };
                let Rgb(channels) = *image.get_pixel(x + dx - 1, y + dy - 1);
                for (sum, value) in sums.iter_mut().zip(channels) {
                    *sum += weight * u32::from(value);
                }
            }
            let averaged = sums.map(|sum| {
                ((sum + SMOOTH_TOTAL_WEIGHT / 2) / SMOOTH_TOTAL_WEIGHT) as u8
            });
            smoothed.put_pixel(x, y, Rgb(averaged));
        }
    }
    smoothed
}
