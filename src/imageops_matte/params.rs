//! Validated parameter value objects for the enhancement and refinement stages.
//!
//! Every type here is immutable once built: constructors check ranges up front, so the
//! processing functions never see an out-of-range value.

use crate::error::Error;
use crate::utils::{validate_non_negative, validate_positive};

/// Parameters of the preprocessing pipeline
///
/// Built through [`EnhancementParameters::builder`] or one of the named presets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementParameters {
    contrast_gain: f32,
    sharpness_gain: f32,
    brightness_gain: f32,
    clahe_clip_limit: f32,
    clahe_tile_grid: (u32, u32),
    median_filter_radius: u32,
    unsharp_radius: f32,
    unsharp_amount_percent: f32,
    unsharp_threshold: u8,
}

impl EnhancementParameters {
    /// Starts a builder preloaded with neutral gains and the [`clahe_unsharp`] settings
    ///
    /// [`clahe_unsharp`]: EnhancementParameters::clahe_unsharp
    #[must_use]
    pub const fn builder() -> EnhancementParametersBuilder {
        EnhancementParametersBuilder::new()
    }

    /// Median radius 1, CLAHE clip 3.0 on an 8x8 grid, unsharp mask of radius 2 at
    /// 150 % with threshold 3, neutral gains
    #[must_use]
    pub const fn clahe_unsharp() -> Self {
        EnhancementParametersBuilder::new().params
    }

    /// Same as [`clahe_unsharp`](EnhancementParameters::clahe_unsharp) with the given
    /// brightness, contrast and sharpness gains
    ///
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When a gain is not a finite positive value
    pub fn flat_gains(brightness: f32, contrast: f32, sharpness: f32) -> Result<Self, Error> {
        Self::builder()
            .brightness_gain(brightness)
            .contrast_gain(contrast)
            .sharpness_gain(sharpness)
            .build()
    }

    #[must_use]
    pub const fn contrast_gain(&self) -> f32 {
        self.contrast_gain
    }

    #[must_use]
    pub const fn sharpness_gain(&self) -> f32 {
        self.sharpness_gain
    }

    #[must_use]
    pub const fn brightness_gain(&self) -> f32 {
        self.brightness_gain
    }

    #[must_use]
    pub const fn clahe_clip_limit(&self) -> f32 {
        self.clahe_clip_limit
    }

    /// Number of CLAHE tiles along (x, y)
    #[must_use]
    pub const fn clahe_tile_grid(&self) -> (u32, u32) {
        self.clahe_tile_grid
    }

    #[must_use]
    pub const fn median_filter_radius(&self) -> u32 {
        self.median_filter_radius
    }

    #[must_use]
    pub const fn unsharp_radius(&self) -> f32 {
        self.unsharp_radius
    }

    #[must_use]
    pub const fn unsharp_amount_percent(&self) -> f32 {
        self.unsharp_amount_percent
    }

    #[must_use]
    pub const fn unsharp_threshold(&self) -> u8 {
        self.unsharp_threshold
    }

    /// The scalar gains as a standalone value, for [`adjust_tone`](crate::adjust_tone)
    #[must_use]
    pub const fn tone_gains(&self) -> ToneGains {
        ToneGains {
            brightness: self.brightness_gain,
            contrast: self.contrast_gain,
            sharpness: self.sharpness_gain,
        }
    }
}

/// Builder for [`EnhancementParameters`]
#[derive(Debug, Clone, Copy)]
pub struct EnhancementParametersBuilder {
    params: EnhancementParameters,
}

impl EnhancementParametersBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            params: EnhancementParameters {
                contrast_gain: 1.0,
                sharpness_gain: 1.0,
                brightness_gain: 1.0,
                clahe_clip_limit: 3.0,
                clahe_tile_grid: (8, 8),
                median_filter_radius: 1,
                unsharp_radius: 2.0,
                unsharp_amount_percent: 150.0,
                unsharp_threshold: 3,
            },
        }
    }

    #[must_use]
    pub const fn contrast_gain(mut self, gain: f32) -> Self {
        self.params.contrast_gain = gain;
        self
    }

    #[must_use]
    pub const fn sharpness_gain(mut self, gain: f32) -> Self {
        self.params.sharpness_gain = gain;
        self
    }

    #[must_use]
    pub const fn brightness_gain(mut self, gain: f32) -> Self {
        self.params.brightness_gain = gain;
        self
    }

    #[must_use]
    pub const fn clahe_clip_limit(mut self, clip_limit: f32) -> Self {
        self.params.clahe_clip_limit = clip_limit;
        self
    }

    #[must_use]
    pub const fn clahe_tile_grid(mut self, tiles_x: u32, tiles_y: u32) -> Self {
        self.params.clahe_tile_grid = (tiles_x, tiles_y);
        self
    }

    #[must_use]
    pub const fn median_filter_radius(mut self, radius: u32) -> Self {
        self.params.median_filter_radius = radius;
        self
    }

    #[must_use]
    pub const fn unsharp_radius(mut self, radius: f32) -> Self {
        self.params.unsharp_radius = radius;
        self
    }

    #[must_use]
    pub const fn unsharp_amount_percent(mut self, amount: f32) -> Self {
        self.params.unsharp_amount_percent = amount;
        self
    }

    #[must_use]
    pub const fn unsharp_threshold(mut self, threshold: u8) -> Self {
        self.params.unsharp_threshold = threshold;
        self
    }

    /// Validates every field and returns the parameters
    ///
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When a gain, the clip limit or the unsharp radius
    ///   is not finite and positive, the unsharp amount is negative, or a tile grid
    ///   dimension is zero
    pub fn build(self) -> Result<EnhancementParameters, Error> {
        let p = self.params;
        validate_positive("contrast_gain", p.contrast_gain)?;
        validate_positive("sharpness_gain", p.sharpness_gain)?;
        validate_positive("brightness_gain", p.brightness_gain)?;
        validate_positive("clahe_clip_limit", p.clahe_clip_limit)?;
        validate_tile_grid(p.clahe_tile_grid)?;
        validate_positive("unsharp_radius", p.unsharp_radius)?;
        validate_non_negative("unsharp_amount_percent", p.unsharp_amount_percent)?;
        Ok(p)
    }
}

impl Default for EnhancementParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_tile_grid((tiles_x, tiles_y): (u32, u32)) -> Result<(), Error> {
    if tiles_x == 0 || tiles_y == 0 {
        return Err(Error::InvalidParameter(format!(
            "clahe_tile_grid must be non-zero in both directions, got {tiles_x}x{tiles_y}"
        )));
    }
    Ok(())
}

/// Brightness, contrast and sharpness multipliers
///
/// A gain of exactly 1.0 leaves the image untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneGains {
    brightness: f32,
    contrast: f32,
    sharpness: f32,
}

impl ToneGains {
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When a gain is not a finite positive value
    pub fn new(brightness: f32, contrast: f32, sharpness: f32) -> Result<Self, Error> {
        validate_positive("brightness_gain", brightness)?;
        validate_positive("contrast_gain", contrast)?;
        validate_positive("sharpness_gain", sharpness)?;
        Ok(Self {
            brightness,
            contrast,
            sharpness,
        })
    }

    /// All gains set to 1.0
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }

    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    #[must_use]
    pub const fn contrast(&self) -> f32 {
        self.contrast
    }

    #[must_use]
    pub const fn sharpness(&self) -> f32 {
        self.sharpness
    }

    /// Whether every gain is exactly 1.0
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

/// Parameters of the guided filter used on the alpha mask
///
/// `epsilon` is expressed on the normalized [0, 1] scale. A radius of 0 turns the
/// alpha refinement into a no-op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidedFilterParameters {
    radius: u32,
    epsilon: f32,
}

impl GuidedFilterParameters {
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When `epsilon` is not a finite positive value
    pub fn new(radius: u32, epsilon: f32) -> Result<Self, Error> {
        validate_positive("epsilon", epsilon)?;
        Ok(Self { radius, epsilon })
    }

    /// Radius 5, epsilon 0.01
    #[must_use]
    pub const fn matting_default() -> Self {
        Self {
            radius: 5,
            epsilon: 0.01,
        }
    }

    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    #[must_use]
    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

/// Parameters of the domain-transform recursive filter
///
/// `sigma_spatial` is in pixels, `sigma_range` on the normalized [0, 1] scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePreservingParameters {
    sigma_spatial: f32,
    sigma_range: f32,
    iterations: u32,
}

impl EdgePreservingParameters {
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When a sigma is not finite and positive, or
    ///   `iterations` is zero
    pub fn new(sigma_spatial: f32, sigma_range: f32, iterations: u32) -> Result<Self, Error> {
        validate_positive("sigma_spatial", sigma_spatial)?;
        validate_positive("sigma_range", sigma_range)?;
        if iterations == 0 {
            return Err(Error::InvalidParameter(
                "iterations must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sigma_spatial,
            sigma_range,
            iterations,
        })
    }

    #[must_use]
    pub const fn sigma_spatial(&self) -> f32 {
        self.sigma_spatial
    }

    #[must_use]
    pub const fn sigma_range(&self) -> f32 {
        self.sigma_range
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for EdgePreservingParameters {
    fn default() -> Self {
        Self {
            sigma_spatial: 10.0,
            sigma_range: 0.05,
            iterations: 3,
        }
    }
}

/// Which image steers the guided filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Guidance {
    /// The RGB image the mask belongs to
    #[default]
    Image,
    /// The raw alpha mask itself
    SelfGuided,
}

/// Full configuration of the alpha refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementParameters {
    pub guided: GuidedFilterParameters,
    pub guidance: Guidance,
    /// Edge-preserving smoothing after the guided filter, skipped when `None`
    pub smoothing: Option<EdgePreservingParameters>,
}

impl From<GuidedFilterParameters> for RefinementParameters {
    fn from(guided: GuidedFilterParameters) -> Self {
        Self {
            guided,
            guidance: Guidance::default(),
            smoothing: Some(EdgePreservingParameters::default()),
        }
    }
}

impl Default for RefinementParameters {
    fn default() -> Self {
        GuidedFilterParameters::matting_default().into()
    }
}

/// Parameters of the threshold-and-feather refinement
///
/// The mask is binarized (`alpha > threshold` becomes opaque, everything else
/// transparent) and the hard edge is then softened with a Gaussian of `sigma` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatherParameters {
    threshold: u8,
    sigma: f32,
}

impl FeatherParameters {
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When `sigma` is not finite and positive
    pub fn new(threshold: u8, sigma: f32) -> Result<Self, Error> {
        validate_positive("feather sigma", sigma)?;
        Ok(Self { threshold, sigma })
    }

    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    #[must_use]
    pub const fn sigma(&self) -> f32 {
        self.sigma
    }
}

impl Default for FeatherParameters {
    /// Any non-zero alpha is foreground; sigma 1.1 matches a 5x5 Gaussian kernel.
    fn default() -> Self {
        Self {
            threshold: 0,
            sigma: 1.1,
        }
    }
}

/// How the raw mask of a matting backend is cleaned up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaRefinement {
    /// Guided filter, optionally followed by edge-preserving smoothing
    Guided(RefinementParameters),
    /// Binarize, then blur the hard edge. Cheap, ignores the colour image.
    Feather(FeatherParameters),
}

impl Default for AlphaRefinement {
    fn default() -> Self {
        Self::Guided(RefinementParameters::default())
    }
}

impl From<RefinementParameters> for AlphaRefinement {
    fn from(params: RefinementParameters) -> Self {
        Self::Guided(params)
    }
}

impl From<GuidedFilterParameters> for AlphaRefinement {
    fn from(params: GuidedFilterParameters) -> Self {
        Self::Guided(params.into())
    }
}

impl From<FeatherParameters> for AlphaRefinement {
    fn from(params: FeatherParameters) -> Self {
        Self::Feather(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let params = EnhancementParameters::clahe_unsharp();
        assert_eq!(params.median_filter_radius(), 1);
        assert_eq!(params.clahe_clip_limit(), 3.0);
        assert_eq!(params.clahe_tile_grid(), (8, 8));
        assert_eq!(params.unsharp_radius(), 2.0);
        assert_eq!(params.unsharp_amount_percent(), 150.0);
        assert_eq!(params.unsharp_threshold(), 3);
        assert!(params.tone_gains().is_neutral());
    }

    #[test]
    fn test_builder_validates_ranges() {
        assert!(EnhancementParameters::builder().build().is_ok());
        assert!(EnhancementParameters::builder()
            .contrast_gain(0.0)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .brightness_gain(f32::NAN)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .clahe_clip_limit(-1.0)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .clahe_tile_grid(0, 8)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .unsharp_radius(0.0)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .unsharp_amount_percent(-10.0)
            .build()
            .is_err());
        assert!(EnhancementParameters::builder()
            .unsharp_amount_percent(0.0)
            .median_filter_radius(0)
            .build()
            .is_ok());
    }

    #[test]
    fn test_flat_gains() {
        let params = EnhancementParameters::flat_gains(1.2, 0.8, 1.5).unwrap();
        let gains = params.tone_gains();
        assert_eq!(gains.brightness(), 1.2);
        assert_eq!(gains.contrast(), 0.8);
        assert_eq!(gains.sharpness(), 1.5);
        assert!(!gains.is_neutral());
        assert!(EnhancementParameters::flat_gains(0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_guided_filter_parameters() {
        assert!(GuidedFilterParameters::new(0, 0.01).is_ok());
        assert!(GuidedFilterParameters::new(1, 0.0).is_err());
        assert!(GuidedFilterParameters::new(1, -0.1).is_err());
        let params = GuidedFilterParameters::matting_default();
        assert_eq!((params.radius(), params.epsilon()), (5, 0.01));
    }

    #[test]
    fn test_edge_preserving_parameters() {
        assert!(EdgePreservingParameters::new(10.0, 0.05, 3).is_ok());
        assert!(EdgePreservingParameters::new(0.0, 0.05, 3).is_err());
        assert!(EdgePreservingParameters::new(10.0, 0.0, 3).is_err());
        assert!(EdgePreservingParameters::new(10.0, 0.05, 0).is_err());
        let defaults = EdgePreservingParameters::default();
        assert_eq!(defaults.sigma_spatial(), 10.0);
        assert_eq!(defaults.sigma_range(), 0.05);
        assert_eq!(defaults.iterations(), 3);
    }

    #[test]
    fn test_refinement_from_guided() {
        let guided = GuidedFilterParameters::new(2, 0.1).unwrap();
        let refinement = RefinementParameters::from(guided);
        assert_eq!(refinement.guided, guided);
        assert_eq!(refinement.guidance, Guidance::Image);
        assert_eq!(
            refinement.smoothing,
            Some(EdgePreservingParameters::default())
        );
    }

    #[test]
    fn test_feather_parameters() {
        let params = FeatherParameters::new(127, 2.0).unwrap();
        assert_eq!((params.threshold(), params.sigma()), (127, 2.0));
        assert!(FeatherParameters::new(0, 0.0).is_err());
        assert!(FeatherParameters::new(0, f32::NAN).is_err());

        let defaults = FeatherParameters::default();
        assert_eq!((defaults.threshold(), defaults.sigma()), (0, 1.1));
    }

    #[test]
    fn test_alpha_refinement_conversions() {
        assert_eq!(
            AlphaRefinement::default(),
            AlphaRefinement::Guided(RefinementParameters::default())
        );
        assert_eq!(
            AlphaRefinement::from(GuidedFilterParameters::matting_default()),
            AlphaRefinement::Guided(RefinementParameters::default())
        );
        assert!(matches!(
            AlphaRefinement::from(FeatherParameters::default()),
            AlphaRefinement::Feather(_)
        ));
    }
}
