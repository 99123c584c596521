//! Integration tests for imageops-matte workflows
//!
//! These tests drive the stages the way a host application does: enhance, hand the
//! result to a matting backend, then refine and composite its output.

use image::{Luma, Rgb, Rgba};
use imageops_matte::{
    postprocess, postprocess_rgba, preprocess, refine_alpha, remove_background,
    BackgroundRemovalConfig, EnhancementParameters, Error, FeatherParameters, Guidance,
    GuidedFilterParameters, Image, Matte, MattingBackend, PipelineError, RefinementParameters,
};

/// Test helper to create a test RGB image: a bright square on a dark background
fn create_test_image() -> Image<Rgb<u8>> {
    Image::from_fn(16, 16, |x, y| {
        if (4..12).contains(&x) && (4..12).contains(&y) {
            Rgb([200, 100, 50])
        } else {
            Rgb([40, 50, 60])
        }
    })
}

/// Backend that marks bright pixels as foreground, with a little speckle noise
struct ThresholdBackend {
    calls: usize,
}

impl MattingBackend for ThresholdBackend {
    type Error = std::convert::Infallible;

    fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
        self.calls += 1;
        let alpha = Image::from_fn(image.width(), image.height(), |x, y| {
            let Rgb([r, _, _]) = *image.get_pixel(x, y);
            let speckle = (x * 7 + y * 3) % 11 == 0;
            match (r > 120, speckle) {
                (true, false) | (false, true) => Luma([255]),
                _ => Luma([0]),
            }
        });
        Ok(Matte { rgb: image, alpha })
    }
}

/// Backend for models that only return colour, without a mask
struct ColourOnlyBackend;

impl MattingBackend for ColourOnlyBackend {
    type Error = std::convert::Infallible;

    fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
        Ok(Matte::opaque(image))
    }
}

/// Backend whose mask leaks faintly into the background
struct LeakyBackend;

impl MattingBackend for LeakyBackend {
    type Error = std::convert::Infallible;

    fn matte(&mut self, image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
        let alpha = Image::from_fn(image.width(), image.height(), |x, y| {
            let inside = (4..12).contains(&x) && (4..12).contains(&y);
            Luma([if inside { 230 } else { 12 }])
        });
        Ok(Matte { rgb: image, alpha })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("model unavailable")]
struct ModelUnavailable;

struct FailingBackend;

impl MattingBackend for FailingBackend {
    type Error = ModelUnavailable;

    fn matte(&mut self, _image: Image<Rgb<u8>>) -> Result<Matte, Self::Error> {
        Err(ModelUnavailable)
    }
}

fn default_config() -> BackgroundRemovalConfig {
    BackgroundRemovalConfig::new(
        EnhancementParameters::clahe_unsharp(),
        RefinementParameters::default(),
    )
}

#[test]
fn flat_gray_image_survives_preprocessing_unchanged() {
    let image = Image::from_pixel(4, 4, Rgb([128u8, 128, 128]));
    let params = EnhancementParameters::builder()
        .contrast_gain(1.0)
        .sharpness_gain(1.0)
        .brightness_gain(1.0)
        .clahe_clip_limit(3.0)
        .clahe_tile_grid(2, 2)
        .median_filter_radius(0)
        .unsharp_radius(2.0)
        .unsharp_amount_percent(0.0)
        .unsharp_threshold(3)
        .build()
        .expect("parameters are valid");

    let enhanced = preprocess(&image, &params).expect("preprocessing should succeed");
    assert_eq!(enhanced, image);
}

#[test]
fn checkerboard_alpha_is_smoothed_against_flat_guide() {
    let raw = Image::from_fn(4, 4, |x, y| Luma([if (x + y) % 2 == 0 { 0u8 } else { 255 }]));
    let guide = Image::from_pixel(4, 4, Rgb([128u8, 128, 128]));
    let params = GuidedFilterParameters::new(1, 0.01).expect("parameters are valid");

    let refined = refine_alpha(&raw, &guide, &params).expect("refinement should succeed");
    for pixel in refined.pixels() {
        assert!(pixel[0] > 0 && pixel[0] < 255, "hard edge left: {}", pixel[0]);
    }
}

#[test]
fn remove_background_produces_rgba_of_input_size() {
    let image = create_test_image();
    let mut backend = ThresholdBackend { calls: 0 };

    let result = remove_background(&image, &mut backend, &default_config())
        .expect("background removal should succeed");

    assert_eq!(backend.calls, 1);
    assert_eq!(result.dimensions(), image.dimensions());
    // Centre of the square is foreground, corner is background
    assert!(result.get_pixel(8, 8)[3] > 180);
    assert!(result.get_pixel(0, 15)[3] < 80);
}

#[test]
fn colour_only_backend_yields_opaque_cutout() {
    let image = create_test_image();
    let result = remove_background(&image, &mut ColourOnlyBackend, &default_config())
        .expect("background removal should succeed");

    assert_eq!(result.dimensions(), image.dimensions());
    assert!(result.pixels().all(|p| p[3] >= 254));
}

#[test]
fn feathered_refinement_drops_faint_leakage() {
    let image = create_test_image();
    let config = BackgroundRemovalConfig::new(
        EnhancementParameters::clahe_unsharp(),
        FeatherParameters::new(20, 1.1).expect("parameters are valid"),
    );

    let result = remove_background(&image, &mut LeakyBackend, &config)
        .expect("background removal should succeed");

    assert_eq!(result.get_pixel(0, 0)[3], 0);
    assert_eq!(result.get_pixel(15, 15)[3], 0);
    assert_eq!(result.get_pixel(8, 8)[3], 255);
    let edge = result.get_pixel(4, 8)[3];
    assert!(edge > 0 && edge < 255, "edge alpha {edge}");
}

#[test]
fn remove_background_reports_backend_failure() {
    let image = create_test_image();
    let result = remove_background(&image, &mut FailingBackend, &default_config());

    match result {
        Err(PipelineError::Backend(source)) => assert_eq!(source.to_string(), "model unavailable"),
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[test]
fn remove_background_rejects_empty_input_before_matting() {
    let image: Image<Rgb<u8>> = Image::new(0, 0);
    let mut backend = ThresholdBackend { calls: 0 };

    let result = remove_background(&image, &mut backend, &default_config());
    assert!(matches!(
        result,
        Err(PipelineError::Processing(Error::InvalidDimensions { .. }))
    ));
    assert_eq!(backend.calls, 0);
}

#[test]
fn rgba_backend_output_can_be_refined_directly() {
    let image = create_test_image();
    let rgba = Image::from_fn(16, 16, |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Rgba([r, g, b, if r > 120 { 255 } else { 0 }])
    });

    let from_rgba = postprocess_rgba(&rgba, &RefinementParameters::default())
        .expect("refinement should succeed");

    let matte = Matte::from_rgba(&rgba);
    let from_parts = postprocess(&matte.rgb, &matte.alpha, &GuidedFilterParameters::matting_default())
        .expect("refinement should succeed");

    assert_eq!(from_rgba, from_parts);
}

#[test]
fn self_guided_refinement_ignores_guide_colours() {
    let raw = Image::from_fn(12, 12, |x, _| Luma([if x < 6 { 0u8 } else { 255 }]));
    let guide_a = Image::from_pixel(12, 12, Rgb([0u8, 0, 0]));
    let guide_b = create_test_image_sized(12, 12);
    let params = RefinementParameters {
        guided: GuidedFilterParameters::new(2, 0.01).expect("parameters are valid"),
        guidance: Guidance::SelfGuided,
        smoothing: None,
    };

    let with_a = imageops_matte::refine_alpha_with(&raw, &guide_a, &params).unwrap();
    let with_b = imageops_matte::refine_alpha_with(&raw, &guide_b, &params).unwrap();
    assert_eq!(with_a, with_b);
}

fn create_test_image_sized(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 128]))
}
