//! Noise reduction and sharpening on 8-bit images.
//!
//! Both filters work channel by channel and accept any radius on any non-empty image.
//! The median reads outside the image through mirrored borders.

use image::{ImageBuffer, Luma, Pixel};
use imageproc::definitions::Image;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::error::Error;
use crate::utils::{
    fill_pixels, reflect_index, round_to_u8, validate_non_empty_image, validate_non_negative,
    validate_positive,
};

/// Trait providing the detail enhancement filters
pub trait DetailEnhanceExt: Sized {
    /// Replaces every sample with the median of its `(2 * radius + 1)^2` neighbourhood
    ///
    /// A radius of 0 returns an unchanged copy.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image is empty
    fn median_filter(&self, radius: u32) -> Result<Self, Error>;

    /// Sharpens the image with an unsharp mask
    ///
    /// `sharpened = original + amount_percent / 100 * (original - blurred)`, applied only
    /// where `|original - blurred| >= threshold`.
    ///
    /// # Arguments
    ///
    /// * `radius` - Standard deviation of the Gaussian blur, in pixels
    /// * `amount_percent` - Strength of the correction in percent
    /// * `threshold` - Minimum difference from the blurred image for a sample to change
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image is empty
    /// * `Error::InvalidParameter` - When `radius` is not positive or `amount_percent`
    ///   is negative
    fn unsharp_mask(&self, radius: f32, amount_percent: f32, threshold: u8) -> Result<Self, Error>;
}

impl<P> DetailEnhanceExt for Image<P>
where
    P: Pixel<Subpixel = u8> + Sync,
{
    fn median_filter(&self, radius: u32) -> Result<Self, Error> {
        median_filter(self, radius)
    }

    fn unsharp_mask(&self, radius: f32, amount_percent: f32, threshold: u8) -> Result<Self, Error> {
        unsharp_mask(self, radius, amount_percent, threshold)
    }
}

/// Median filter with mirrored borders
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
pub fn median_filter<P>(image: &Image<P>, radius: u32) -> Result<Image<P>, Error>
where
    P: Pixel<Subpixel = u8> + Sync,
{
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;

    if radius == 0 {
        debug!("median radius is 0, skipping noise reduction");
        return Ok(image.clone());
    }

    let channels = usize::from(P::CHANNEL_COUNT);
    let radius = i64::from(radius);
    let window_len = ((2 * radius + 1) * (2 * radius + 1)) as usize;
    let raw = image.as_raw();

    let filtered = fill_pixels(width, height, channels, |x, y, pixel| {
        let mut window = Vec::with_capacity(window_len);
        for (channel, out) in pixel.iter_mut().enumerate() {
            window.clear();
            for dy in -radius..=radius {
                let sy = reflect_index(i64::from(y) + dy, height) as usize;
                for dx in -radius..=radius {
                    let sx = reflect_index(i64::from(x) + dx, width) as usize;
                    window.push(raw[(sy * width as usize + sx) * channels + channel]);
                }
            }
            let middle = window.len() / 2;
            *out = *window.select_nth_unstable(middle).1;
        }
    });

    ImageBuffer::from_raw(width, height, filtered).ok_or(Error::InvalidDimensions { width, height })
}

/// Unsharp mask with a noise threshold
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
/// * `Error::InvalidParameter` - When `radius` is not positive or `amount_percent` is
///   negative
pub fn unsharp_mask<P>(
    image: &Image<P>,
    radius: f32,
    amount_percent: f32,
    threshold: u8,
) -> Result<Image<P>, Error>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;
    validate_positive("unsharp radius", radius)?;
    validate_non_negative("unsharp amount", amount_percent)?;

    if amount_percent == 0.0 {
        debug!("unsharp amount is 0, skipping sharpening");
        return Ok(image.clone());
    }

    // Blurred per channel in f32 so the difference is not truncated to whole levels
    let channels = usize::from(P::CHANNEL_COUNT);
    let blurred: Vec<Vec<f32>> = (0..channels)
        .map(|channel| {
            let plane: Image<Luma<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
                Luma([f32::from(image.get_pixel(x, y).channels()[channel])])
            });
            gaussian_blur_f32(&plane, radius).into_raw()
        })
        .collect();

    let amount = amount_percent / 100.0;
    let threshold = f32::from(threshold);
    let sharpened = image
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let value = f32::from(value);
            let detail = value - blurred[index % channels][index / channels];
            if detail.abs() >= threshold {
                round_to_u8(amount.mul_add(detail, value))
            } else {
                round_to_u8(value)
            }
        })
        .collect();

    ImageBuffer::from_raw(width, height, sharpened)
        .ok_or(Error::InvalidDimensions { width, height })
}
