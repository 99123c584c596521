//! Conversion between 8-bit sRGB images and CIE L\*a\*b\* planes.
//!
//! The planes are kept in `f32` so that splitting and merging an image only costs the
//! final rounding to 8 bits. Contrast operations run on the lightness plane and leave
//! the two chroma planes untouched.

use image::{ImageBuffer, Luma, Rgb};
use imageproc::definitions::Image;
use palette::{FromColor, IntoColor, Lab, LinSrgb, Srgb};

use crate::error::Error;
use crate::utils::{
    pixel_count, round_to_u8, validate_matching_dimensions, validate_non_empty_image,
};

/// Upper bound of the L\* axis
pub const LIGHTNESS_MAX: f32 = 100.0;

/// Lightness and chroma planes of an RGB image
///
/// `l` holds L\* in [0, 100]; `a` and `b` hold the green-red and blue-yellow axes.
/// All three planes share the size of the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceChannelSplit {
    pub l: Image<Luma<f32>>,
    pub a: Image<Luma<f32>>,
    pub b: Image<Luma<f32>>,
}

impl LuminanceChannelSplit {
    /// Dimensions shared by the three planes
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.l.dimensions()
    }

    fn validate(&self) -> Result<(), Error> {
        let (width, height) = self.l.dimensions();
        validate_non_empty_image(width, height)?;
        validate_matching_dimensions((width, height), self.a.dimensions())?;
        validate_matching_dimensions((width, height), self.b.dimensions())
    }
}

/// Trait for splitting an RGB image into lightness and chroma planes
pub trait ToLuminanceChrominance {
    /// Converts the image to L\*a\*b\* planes
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image has zero width or height
    fn to_luminance_chrominance(&self) -> Result<LuminanceChannelSplit, Error>;
}

impl ToLuminanceChrominance for Image<Rgb<u8>> {
    fn to_luminance_chrominance(&self) -> Result<LuminanceChannelSplit, Error> {
        split_luminance_chrominance(self)
    }
}

/// Converts an RGB image to L\*a\*b\* planes (D65 white point)
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image has zero width or height
///
/// # Examples
/// ```no_run
/// use imageops_matte::{merge_luminance_chrominance, split_luminance_chrominance, Image};
/// use image::Rgb;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let image: Image<Rgb<u8>> = Image::from_pixel(8, 8, Rgb([200, 120, 40]));
/// let split = split_luminance_chrominance(&image)?;
/// let restored = merge_luminance_chrominance(split)?;
/// # Ok(())
/// # }
/// ```
pub fn split_luminance_chrominance(image: &Image<Rgb<u8>>) -> Result<LuminanceChannelSplit, Error> {
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;

    let len = pixel_count(width, height);
    let mut l = Vec::with_capacity(len);
    let mut a = Vec::with_capacity(len);
    let mut b = Vec::with_capacity(len);

    for &Rgb([red, green, blue]) in image.pixels() {
        let lab = rgb_to_lab(red, green, blue);
        l.push(lab.l);
        a.push(lab.a);
        b.push(lab.b);
    }

    Ok(LuminanceChannelSplit {
        l: plane_from_raw(width, height, l)?,
        a: plane_from_raw(width, height, a)?,
        b: plane_from_raw(width, height, b)?,
    })
}

/// Recombines L\*a\*b\* planes into an 8-bit RGB image
///
/// Colours that fall outside the sRGB gamut after editing the lightness plane are
/// clamped per channel.
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the planes are empty
/// * `Error::DimensionMismatch` - When the chroma planes differ in size from `l`
pub fn merge_luminance_chrominance(split: LuminanceChannelSplit) -> Result<Image<Rgb<u8>>, Error> {
    split.validate()?;
    let (width, height) = split.dimensions();

    let raw = split
        .l
        .iter()
        .zip(split.a.iter())
        .zip(split.b.iter())
        .flat_map(|((&l, &a), &b)| lab_to_rgb(Lab::new(l, a, b)))
        .collect();

    ImageBuffer::from_raw(width, height, raw).ok_or(Error::InvalidDimensions { width, height })
}

#[inline]
fn rgb_to_lab(red: u8, green: u8, blue: u8) -> Lab {
    let srgb = Srgb::new(red, green, blue).into_format::<f32>();
    let linear: LinSrgb<f32> = srgb.into_linear();
    Lab::from_color(linear)
}

#[inline]
fn lab_to_rgb(lab: Lab) -> [u8; 3] {
    let linear: LinSrgb<f32> = lab.into_color();
    let srgb: Srgb<f32> = Srgb::from_linear(linear);
    let max_value = f32::from(u8::MAX);
    [
        round_to_u8(srgb.red.clamp(0.0, 1.0) * max_value),
        round_to_u8(srgb.green.clamp(0.0, 1.0) * max_value),
        round_to_u8(srgb.blue.clamp(0.0, 1.0) * max_value),
    ]
}

fn plane_from_raw(width: u32, height: u32, raw: Vec<f32>) -> Result<Image<Luma<f32>>, Error> {
    ImageBuffer::from_raw(width, height, raw).ok_or(Error::InvalidDimensions { width, height })
}
