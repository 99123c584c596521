//! Image enhancement and alpha matte refinement for background removal.
//!
//! The crate prepares a photograph for a segmentation model and cleans up the alpha
//! mask the model returns:
//!
//! `image -> preprocess -> [MattingBackend] -> (rgb, raw alpha) -> postprocess -> RGBA`
//!
//! The model itself is not part of the crate; it is reached through the
//! [`MattingBackend`] trait.

mod error;
mod imageops_matte;
#[cfg(test)]
mod test_utils;
mod utils;

use image::{ImageBuffer, Pixel};

pub use error::{Error, PipelineError};
pub use imageops_matte::alpha_refine::{
    feather_alpha, refine_alpha, refine_alpha_with, refine_matte, AlphaMask, RefineAlphaExt,
};
pub use imageops_matte::apply_alpha_mask::{composite, ApplyAlphaMask, ModifyAlpha};
pub use imageops_matte::box_filter::BoxFilter;
pub use imageops_matte::clahe::{enhance_contrast, equalize_lightness, ClaheExt};
pub use imageops_matte::color_space::{
    merge_luminance_chrominance, split_luminance_chrominance, LuminanceChannelSplit,
    ToLuminanceChrominance, LIGHTNESS_MAX,
};
pub use imageops_matte::detail::{median_filter, unsharp_mask, DetailEnhanceExt};
pub use imageops_matte::guided_filter::{GuidedFilterColor, GuidedFilterExt, GuidedFilterGray};
pub use imageops_matte::matting::{Matte, MattingBackend};
pub use imageops_matte::params::{
    AlphaRefinement, EdgePreservingParameters, EnhancementParameters,
    EnhancementParametersBuilder, FeatherParameters, Guidance, GuidedFilterParameters,
    RefinementParameters, ToneGains,
};
pub use imageops_matte::pipeline::{
    postprocess, postprocess_rgba, postprocess_with, preprocess, remove_background,
    BackgroundRemovalConfig,
};
pub use imageops_matte::recursive_filter::EdgePreservingFilterExt;
pub use imageops_matte::summed_area_table::SummedAreaTable;
pub use imageops_matte::tone::{adjust_tone, ToneAdjustExt};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
