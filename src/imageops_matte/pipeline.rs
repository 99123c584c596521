//! Stage orchestration: enhancement before matting, refinement and compositing after.

use image::{Rgb, Rgba};
use imageproc::definitions::Image;
use tracing::debug;

use crate::error::{Error, PipelineError};
use crate::imageops_matte::alpha_refine::{refine_alpha, refine_alpha_with, refine_matte, AlphaMask};
use crate::imageops_matte::apply_alpha_mask::{composite, ModifyAlpha};
use crate::imageops_matte::clahe::equalize_lightness;
use crate::imageops_matte::color_space::{merge_luminance_chrominance, split_luminance_chrominance};
use crate::imageops_matte::detail::{median_filter, unsharp_mask};
use crate::imageops_matte::matting::MattingBackend;
use crate::imageops_matte::params::{
    AlphaRefinement, EnhancementParameters, GuidedFilterParameters, RefinementParameters,
};
use crate::imageops_matte::tone::adjust_tone;
use crate::utils::{validate_matching_dimensions, validate_non_empty_image};

/// Enhances an image before it is handed to the matting backend
///
/// Runs noise reduction, then CLAHE on the lightness plane, then the unsharp mask,
/// then the scalar tone gains. The order matters: sharpening amplifies whatever noise
/// and contrast structure the earlier stages leave behind. The input is not modified.
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
///
/// # Examples
/// ```no_run
/// use imageops_matte::{preprocess, EnhancementParameters, Image};
/// use image::Rgb;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let image: Image<Rgb<u8>> = Image::from_pixel(64, 64, Rgb([120, 90, 60]));
/// let enhanced = preprocess(&image, &EnhancementParameters::clahe_unsharp())?;
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
pub fn preprocess(
    image: &Image<Rgb<u8>>,
    params: &EnhancementParameters,
) -> Result<Image<Rgb<u8>>, Error> {
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;

    let denoised = median_filter(image, params.median_filter_radius())?;

    let mut split = split_luminance_chrominance(&denoised)?;
    split.l = equalize_lightness(&split.l, params.clahe_clip_limit(), params.clahe_tile_grid())?;
    let contrasted = merge_luminance_chrominance(split)?;

    let sharpened = unsharp_mask(
        &contrasted,
        params.unsharp_radius(),
        params.unsharp_amount_percent(),
        params.unsharp_threshold(),
    )?;

    let gains = params.tone_gains();
    if gains.is_neutral() {
        debug!("tone gains are neutral, skipping");
        return Ok(sharpened);
    }
    adjust_tone(&sharpened, &gains)
}

/// Refines the raw alpha against `rgb` and attaches it as the fourth channel
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the mask and the image differ in size
/// * `Error::InvalidDimensions` - When the image is empty
pub fn postprocess(
    rgb: &Image<Rgb<u8>>,
    raw_alpha: &AlphaMask,
    params: &GuidedFilterParameters,
) -> Result<Image<Rgba<u8>>, Error> {
    composite(rgb, &refine_alpha(raw_alpha, rgb, params)?)
}

/// Same as [`postprocess`] with an explicit refinement mode
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the mask and the image differ in size
/// * `Error::InvalidDimensions` - When the image is empty
#[tracing::instrument(level = "debug", skip_all)]
pub fn postprocess_with(
    rgb: &Image<Rgb<u8>>,
    raw_alpha: &AlphaMask,
    params: &AlphaRefinement,
) -> Result<Image<Rgba<u8>>, Error> {
    composite(rgb, &refine_matte(raw_alpha, rgb, params)?)
}

/// Refines the alpha channel of a backend's RGBA output in place of a separate mask
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
pub fn postprocess_rgba(
    rgba: &Image<Rgba<u8>>,
    params: &RefinementParameters,
) -> Result<Image<Rgba<u8>>, Error> {
    let (rgb, raw_alpha) = rgba.split_alpha();
    let refined = refine_alpha_with(&raw_alpha, &rgb, params)?;
    rgba.clone().replace_alpha(&refined)
}

/// Settings of a full background removal run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundRemovalConfig {
    pub enhancement: EnhancementParameters,
    pub refinement: AlphaRefinement,
}

impl BackgroundRemovalConfig {
    /// `refinement` accepts [`RefinementParameters`], [`GuidedFilterParameters`] or
    /// [`FeatherParameters`](crate::FeatherParameters).
    #[must_use]
    pub fn new(
        enhancement: EnhancementParameters,
        refinement: impl Into<AlphaRefinement>,
    ) -> Self {
        Self {
            enhancement,
            refinement: refinement.into(),
        }
    }
}

/// Enhances `image`, mattes it with `backend` and refines the result into an RGBA image
///
/// The backend's colour output, not the original image, provides the RGB channels and
/// guides the refinement.
///
/// # Errors
///
/// * `PipelineError::Processing` - When a stage rejects its input, including a backend
///   result whose size differs from the image
/// * `PipelineError::Backend` - When the backend fails
#[tracing::instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
pub fn remove_background<B>(
    image: &Image<Rgb<u8>>,
    backend: &mut B,
    config: &BackgroundRemovalConfig,
) -> Result<Image<Rgba<u8>>, PipelineError>
where
    B: MattingBackend + ?Sized,
{
    let enhanced = preprocess(image, &config.enhancement)?;
    let expected = enhanced.dimensions();

    let matte = backend
        .matte(enhanced)
        .map_err(|error| PipelineError::Backend(Box::new(error)))?;
    validate_matching_dimensions(expected, matte.rgb.dimensions())?;
    validate_matching_dimensions(expected, matte.alpha.dimensions())?;
    debug!("matting backend returned a matte");

    Ok(postprocess_with(&matte.rgb, &matte.alpha, &config.refinement)?)
}
