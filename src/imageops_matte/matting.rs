//! Seam to the segmentation model that estimates the raw alpha mask.

use image::{Luma, Rgb, Rgba};
use imageproc::definitions::Image;

use crate::error::Error;
use crate::imageops_matte::alpha_refine::AlphaMask;
use crate::imageops_matte::apply_alpha_mask::ModifyAlpha;
use crate::utils::validate_pair;

/// Foreground estimate returned by a matting backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matte {
    pub rgb: Image<Rgb<u8>>,
    pub alpha: AlphaMask,
}

impl Matte {
    /// Pairs colour channels with an alpha mask of the same size
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When the mask size differs from the image
    /// * `Error::InvalidDimensions` - When the image is empty
    pub fn new(rgb: Image<Rgb<u8>>, alpha: AlphaMask) -> Result<Self, Error> {
        validate_pair(&rgb, &alpha)?;
        Ok(Self { rgb, alpha })
    }

    /// Wraps colour-only backend output with a fully opaque mask
    #[must_use]
    pub fn opaque(rgb: Image<Rgb<u8>>) -> Self {
        let (width, height) = rgb.dimensions();
        let alpha = AlphaMask::from_pixel(width, height, Luma([u8::MAX]));
        Self { rgb, alpha }
    }

    /// Splits a backend's RGBA output into colour and alpha
    #[must_use]
    pub fn from_rgba(rgba: &Image<Rgba<u8>>) -> Self {
        let (rgb, alpha) = rgba.split_alpha();
        Self { rgb, alpha }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}

/// A segmentation model that estimates foreground opacity
///
/// The backend receives its own copy of the enhanced image and must return a
/// [`Matte`] of the same size. The call may be slow; it either completes or fails.
///
/// # Examples
///
/// ```no_run
/// use imageops_matte::{Image, Matte, MattingBackend};
/// use image::{Luma, Rgb};
///
/// /// Treats every pixel as foreground
/// struct Opaque;
///
/// impl MattingBackend for Opaque {
///     type Error = std::convert::Infallible;
///
///     fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
///         let (width, height) = image.dimensions();
///         let alpha = Image::from_pixel(width, height, Luma([255]));
///         Ok(Matte { rgb: image, alpha })
///     }
/// }
/// ```
pub trait MattingBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Estimates the foreground of `image`
    ///
    /// # Errors
    ///
    /// Backend specific; surfaced to callers as `PipelineError::Backend`.
    fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error>;
}

impl<B> MattingBackend for &mut B
where
    B: MattingBackend + ?Sized,
{
    type Error = B::Error;

    fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
        (**self).matte(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_alpha_mask, create_test_rgb_image, create_test_rgba_image};

    #[test]
    fn test_new_checks_dimensions() {
        let rgb = create_test_rgb_image();
        assert!(Matte::new(rgb.clone(), create_test_alpha_mask()).is_ok());
        assert_eq!(
            Matte::new(rgb, Image::new(3, 2)),
            Err(Error::DimensionMismatch {
                expected: (2, 2),
                actual: (3, 2)
            })
        );
    }

    #[test]
    fn test_from_rgba() {
        let matte = Matte::from_rgba(&create_test_rgba_image());
        assert_eq!(matte.dimensions(), (2, 2));
        assert_eq!(*matte.rgb.get_pixel(1, 0), Rgb([30, 90, 40]));
        assert_eq!(*matte.alpha.get_pixel(0, 1), Luma([230]));
        assert_eq!(*matte.alpha.get_pixel(1, 0), Luma([0]));
    }

    #[test]
    fn test_opaque_matte() {
        let rgb = create_test_rgb_image();
        let matte = Matte::opaque(rgb.clone());
        assert_eq!(matte.rgb, rgb);
        assert_eq!(matte.dimensions(), matte.alpha.dimensions());
        assert!(matte.alpha.pixels().all(|p| p[0] == 255));
    }
}
