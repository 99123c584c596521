use image::{GenericImageView, Luma, Pixel, Primitive, Rgb, Rgba};
use imageproc::{definitions::Image, map::map_colors, map::map_colors2};

use crate::{error::Error, utils::validate_pair};

/// Attaches a matte to an RGB image, producing the cutout
///
/// Colour channels are copied as they are (straight alpha, never premultiplied).
/// To swap the matte of an image that already carries one, see [`ModifyAlpha`].
pub trait ApplyAlphaMask {
    type Mask: GenericImageView<Pixel = Luma<Self::Subpixel>>;
    type Subpixel: Primitive;

    /// Builds an RGBA cutout whose fourth channel is `mask`
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - the image has no pixels
    /// * `Error::DimensionMismatch` - `mask` is not the size of the image
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use image::{Luma, Rgb};
    /// use imageops_matte::{ApplyAlphaMask, Image};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let photo = Image::from_pixel(64, 48, Rgb([180u8, 140, 120]));
    /// let matte = Image::from_fn(64, 48, |x, _| Luma([if x < 32 { 255u8 } else { 0 }]));
    ///
    /// let cutout = photo.apply_alpha_mask(&matte)?;
    /// assert_eq!(cutout.get_pixel(40, 0)[3], 0);
    /// # Ok(())
    /// # }
    /// ```
    fn apply_alpha_mask(&self, mask: &Self::Mask) -> Result<Image<Rgba<Self::Subpixel>>, Error>
    where
        Rgba<Self::Subpixel>: Pixel<Subpixel = Self::Subpixel>;
}

/// Matte access on images that already have an alpha channel
pub trait ModifyAlpha {
    type Mask: GenericImageView<Pixel = Luma<Self::Subpixel>>;
    type Subpixel: Primitive;

    /// Owned variant of [`ModifyAlpha::replace_alpha_mut`]
    ///
    /// # Errors
    ///
    /// Same as [`ModifyAlpha::replace_alpha_mut`].
    fn replace_alpha(self, mask: &Self::Mask) -> Result<Self, Error>
    where
        Self: Sized;

    /// Overwrites the fourth channel with `mask`, keeping the colour channels
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - the image has no pixels
    /// * `Error::DimensionMismatch` - `mask` is not the size of the image
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use image::{Luma, Rgba};
    /// use imageops_matte::{Image, ModifyAlpha};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut cutout = Image::from_pixel(8, 8, Rgba([90u8, 60, 30, 255]));
    /// let refined = Image::from_pixel(8, 8, Luma([200u8]));
    ///
    /// cutout.replace_alpha_mut(&refined)?;
    /// # Ok(())
    /// # }
    /// ```
    fn replace_alpha_mut(&mut self, mask: &Self::Mask) -> Result<&mut Self, Error>;

    /// Separates the colour planes from the matte
    fn split_alpha(&self) -> (Image<Rgb<Self::Subpixel>>, Self::Mask)
    where
        Rgb<Self::Subpixel>: Pixel<Subpixel = Self::Subpixel>;
}

impl<S> ApplyAlphaMask for Image<Rgb<S>>
where
    Rgb<S>: Pixel<Subpixel = S>,
    S: Primitive,
{
    type Mask = Image<Luma<S>>;
    type Subpixel = S;

    fn apply_alpha_mask(&self, mask: &Self::Mask) -> Result<Image<Rgba<S>>, Error>
    where
        Rgba<S>: Pixel<Subpixel = S>,
    {
        validate_pair(self, mask)?;

        Ok(map_colors2(self, mask, |Rgb([red, green, blue]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        }))
    }
}

impl<S> ModifyAlpha for Image<Rgba<S>>
where
    Rgba<S>: Pixel<Subpixel = S>,
    S: Primitive,
{
    type Mask = Image<Luma<S>>;
    type Subpixel = S;

    fn replace_alpha(mut self, mask: &Self::Mask) -> Result<Self, Error> {
        self.replace_alpha_mut(mask)?;
        Ok(self)
    }

    fn replace_alpha_mut(&mut self, mask: &Self::Mask) -> Result<&mut Self, Error> {
        validate_pair(self, mask)?;

        for (pixel, matte) in self.pixels_mut().zip(mask.pixels()) {
            pixel[3] = matte[0];
        }

        Ok(self)
    }

    fn split_alpha(&self) -> (Image<Rgb<S>>, Self::Mask)
    where
        Rgb<S>: Pixel<Subpixel = S>,
    {
        let rgb = map_colors(self, |Rgba([red, green, blue, _])| Rgb([red, green, blue]));
        let alpha = map_colors(self, |Rgba([_, _, _, alpha])| Luma([alpha]));
        (rgb, alpha)
    }
}

/// Final compositing step: the refined matte becomes the alpha of the enhanced image
///
/// # Errors
///
/// Fails like [`ApplyAlphaMask::apply_alpha_mask`].
pub fn composite(rgb: &Image<Rgb<u8>>, alpha: &Image<Luma<u8>>) -> Result<Image<Rgba<u8>>, Error> {
    rgb.apply_alpha_mask(alpha)
}
