use image::{Luma, Rgb};
use imageproc::definitions::Image;
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors;
use tracing::debug;

use crate::error::Error;
use crate::imageops_matte::guided_filter::GuidedFilterExt;
use crate::imageops_matte::params::{
    AlphaRefinement, FeatherParameters, GuidedFilterParameters, Guidance, RefinementParameters,
};
use crate::imageops_matte::recursive_filter::EdgePreservingFilterExt;
use crate::utils::{
    denormalize_luma, normalize_alpha_with_max, normalize_luma, round_to_u8,
    validate_non_empty_image, validate_pair,
};

/// Single channel opacity raster, 255 = fully opaque
pub type AlphaMask = Image<Luma<u8>>;

/// Trait for refining a raw alpha mask against the image it belongs to
pub trait RefineAlphaExt {
    /// Guided filter followed by edge-preserving smoothing
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When the mask and the guide differ in size
    /// * `Error::InvalidDimensions` - When the mask is empty
    fn refine_alpha(
        &self,
        guide: &Image<Rgb<u8>>,
        params: &GuidedFilterParameters,
    ) -> Result<AlphaMask, Error>;

    /// Refinement with an explicit guidance mode and optional smoothing
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When the mask and the guide differ in size
    /// * `Error::InvalidDimensions` - When the mask is empty
    fn refine_alpha_with(
        &self,
        guide: &Image<Rgb<u8>>,
        params: &RefinementParameters,
    ) -> Result<AlphaMask, Error>;

    /// Binarizes the mask and softens the resulting hard edge
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the mask is empty
    fn feather_alpha(&self, params: &FeatherParameters) -> Result<AlphaMask, Error>;
}

impl RefineAlphaExt for AlphaMask {
    fn refine_alpha(
        &self,
        guide: &Image<Rgb<u8>>,
        params: &GuidedFilterParameters,
    ) -> Result<AlphaMask, Error> {
        refine_alpha(self, guide, params)
    }

    fn refine_alpha_with(
        &self,
        guide: &Image<Rgb<u8>>,
        params: &RefinementParameters,
    ) -> Result<AlphaMask, Error> {
        refine_alpha_with(self, guide, params)
    }

    fn feather_alpha(&self, params: &FeatherParameters) -> Result<AlphaMask, Error> {
        feather_alpha(self, params)
    }
}

/// Refines a raw alpha mask so that it follows the edges of `guide`
///
/// The mask is normalized to [0, 1], filtered with a colour-guided filter, smoothed
/// with the edge-preserving recursive filter at its default settings and brought back
/// to [0, 255]. A radius of 0 returns the mask unchanged, which makes repeated
/// refinement at radius 0 idempotent.
///
/// # Arguments
///
/// * `raw` - Alpha mask produced by the matting backend
/// * `guide` - The RGB image the mask was estimated from
/// * `params` - Window radius and regularization of the guided filter
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the mask and the guide differ in size
/// * `Error::InvalidDimensions` - When the mask is empty
///
/// # Examples
/// ```no_run
/// use imageops_matte::{refine_alpha, GuidedFilterParameters, Image};
/// use image::{Luma, Rgb};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let guide: Image<Rgb<u8>> = Image::from_pixel(32, 32, Rgb([90, 140, 200]));
/// let raw: Image<Luma<u8>> = Image::from_pixel(32, 32, Luma([200]));
/// let refined = refine_alpha(&raw, &guide, &GuidedFilterParameters::matting_default())?;
/// # Ok(())
/// # }
/// ```
pub fn refine_alpha(
    raw: &AlphaMask,
    guide: &Image<Rgb<u8>>,
    params: &GuidedFilterParameters,
) -> Result<AlphaMask, Error> {
    refine_alpha_with(raw, guide, &RefinementParameters::from(*params))
}

/// Refines a raw alpha mask with an explicit guidance mode and optional smoothing
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the mask and the guide differ in size
/// * `Error::InvalidDimensions` - When the mask is empty
#[tracing::instrument(level = "debug", skip_all, fields(radius = params.guided.radius()))]
pub fn refine_alpha_with(
    raw: &AlphaMask,
    guide: &Image<Rgb<u8>>,
    params: &RefinementParameters,
) -> Result<AlphaMask, Error> {
    validate_pair(raw, guide)?;

    let radius = params.guided.radius();
    if radius == 0 {
        debug!("guided filter radius is 0, returning the raw mask");
        return Ok(raw.clone());
    }
    let epsilon = params.guided.epsilon();

    let alpha = normalize_luma(raw);
    let guided = match params.guidance {
        Guidance::Image => {
            alpha.guided_filter_with_color_guidance(&normalize_rgb(guide), radius, epsilon)?
        }
        Guidance::SelfGuided => alpha.guided_filter(&alpha, radius, epsilon)?,
    };

    let smoothed = match &params.smoothing {
        Some(smoothing) => guided.edge_preserving_filter(smoothing)?,
        None => guided,
    };

    Ok(denormalize_luma(&smoothed))
}

/// Threshold-and-feather cleanup of a raw mask
///
/// Samples above the threshold become opaque and the rest transparent, which drops
/// faint background leakage. The hard edge is then blurred with a Gaussian. Unlike
/// [`refine_alpha`] this never looks at the colour image.
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the mask is empty
pub fn feather_alpha(raw: &AlphaMask, params: &FeatherParameters) -> Result<AlphaMask, Error> {
    let (width, height) = raw.dimensions();
    validate_non_empty_image(width, height)?;

    let threshold = params.threshold();
    let binary: Image<Luma<f32>> = map_colors(raw, |Luma([value])| {
        Luma([if value > threshold { 1.0 } else { 0.0 }])
    });
    let feathered = gaussian_blur_f32(&binary, params.sigma());

    Ok(map_colors(&feathered, |Luma([value])| {
        Luma([round_to_u8(value * f32::from(u8::MAX))])
    }))
}

/// Runs whichever refinement `params` selects
///
/// # Errors
///
/// * `Error::DimensionMismatch` - When the mask and the guide differ in size
/// * `Error::InvalidDimensions` - When the mask is empty
pub fn refine_matte(
    raw: &AlphaMask,
    guide: &Image<Rgb<u8>>,
    params: &AlphaRefinement,
) -> Result<AlphaMask, Error> {
    match params {
        AlphaRefinement::Guided(guided) => refine_alpha_with(raw, guide, guided),
        AlphaRefinement::Feather(feather) => {
            validate_pair(raw, guide)?;
            feather_alpha(raw, feather)
        }
    }
}

fn normalize_rgb(image: &Image<Rgb<u8>>) -> Image<Rgb<f32>> {
    let max_value = f32::from(u8::MAX);
    map_colors(image, |Rgb(channels)| {
        Rgb(channels.map(|v| normalize_alpha_with_max(v, max_value)))
    })
}
