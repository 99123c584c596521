//! Edge case and error condition tests
//!
//! This test suite focuses on boundary values, error conditions, and edge cases
//! to ensure that every stage fails fast and behaves at extremes.

use image::{Luma, Rgb, Rgba};
use imageops_matte::{
    adjust_tone, composite, enhance_contrast, postprocess, preprocess, refine_alpha,
    split_luminance_chrominance, ApplyAlphaMask, DetailEnhanceExt, EdgePreservingParameters,
    EnhancementParameters, Error, GuidedFilterParameters, Image, ModifyAlpha, ToneGains,
};

/// Helper to create minimal 1x1 image
fn create_minimal_rgb_image() -> Image<Rgb<u8>> {
    Image::from_pixel(1, 1, Rgb([128, 128, 128]))
}

/// Helper to create minimal 1x1 alpha mask
fn create_minimal_alpha_mask() -> Image<Luma<u8>> {
    Image::from_pixel(1, 1, Luma([128]))
}

#[test]
fn test_minimum_image_size_operations() {
    let image = create_minimal_rgb_image();
    let mask = create_minimal_alpha_mask();

    let enhanced = preprocess(&image, &EnhancementParameters::clahe_unsharp()).unwrap();
    assert_eq!(enhanced.dimensions(), (1, 1));

    let refined = refine_alpha(&mask, &image, &GuidedFilterParameters::matting_default()).unwrap();
    assert_eq!(refined.dimensions(), (1, 1));

    let rgba = postprocess(&image, &mask, &GuidedFilterParameters::matting_default()).unwrap();
    assert_eq!(rgba.dimensions(), (1, 1));
}

#[test]
fn test_single_row_and_single_column_images() {
    let params = EnhancementParameters::clahe_unsharp();
    for (width, height) in [(17, 1), (1, 17)] {
        let image = Image::from_fn(width, height, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 60]));
        let mask = Image::from_fn(width, height, |x, y| Luma([((x + y) * 15) as u8]));

        assert_eq!(preprocess(&image, &params).unwrap().dimensions(), (width, height));
        let refined =
            refine_alpha(&mask, &image, &GuidedFilterParameters::matting_default()).unwrap();
        assert_eq!(refined.dimensions(), (width, height));
    }
}

#[test]
fn test_empty_images_are_rejected_everywhere() {
    let empty_rgb: Image<Rgb<u8>> = Image::new(0, 5);
    let empty_mask: Image<Luma<u8>> = Image::new(0, 5);
    let expected = Error::InvalidDimensions {
        width: 0,
        height: 5,
    };

    assert_eq!(split_luminance_chrominance(&empty_rgb), Err(expected.clone()));
    assert_eq!(
        preprocess(&empty_rgb, &EnhancementParameters::clahe_unsharp()),
        Err(expected.clone())
    );
    assert_eq!(
        enhance_contrast(&empty_mask, 3.0, (8, 8)),
        Err(expected.clone())
    );
    assert_eq!(empty_rgb.median_filter(1), Err(expected.clone()));
    assert_eq!(
        adjust_tone(&empty_rgb, &ToneGains::neutral()),
        Err(expected.clone())
    );
    assert_eq!(
        refine_alpha(
            &empty_mask,
            &empty_rgb,
            &GuidedFilterParameters::matting_default()
        ),
        Err(expected.clone())
    );
    assert_eq!(composite(&empty_rgb, &empty_mask), Err(expected));
}

#[test]
fn test_dimension_mismatch_is_reported_with_both_sizes() {
    let image: Image<Rgb<u8>> = Image::new(8, 6);
    let mask: Image<Luma<u8>> = Image::new(6, 8);
    let expected = Error::DimensionMismatch {
        expected: (6, 8),
        actual: (8, 6),
    };

    assert_eq!(
        refine_alpha(&mask, &image, &GuidedFilterParameters::matting_default()),
        Err(expected.clone())
    );
    assert_eq!(
        image.apply_alpha_mask(&mask),
        Err(Error::DimensionMismatch {
            expected: (8, 6),
            actual: (6, 8),
        })
    );

    let rgba: Image<Rgba<u8>> = Image::new(6, 6);
    assert!(matches!(
        rgba.replace_alpha(&mask),
        Err(Error::DimensionMismatch { .. })
    ));
}

fn invalid<T>(result: Result<T, Error>) -> bool {
    matches!(result, Err(Error::InvalidParameter(_)))
}

#[test]
fn test_invalid_parameters_are_rejected() {
    assert!(invalid(EnhancementParameters::builder().contrast_gain(-1.0).build()));
    assert!(invalid(EnhancementParameters::builder().sharpness_gain(0.0).build()));
    assert!(invalid(EnhancementParameters::builder().brightness_gain(f32::INFINITY).build()));
    assert!(invalid(EnhancementParameters::builder().clahe_clip_limit(0.0).build()));
    assert!(invalid(EnhancementParameters::builder().clahe_tile_grid(4, 0).build()));
    assert!(invalid(EnhancementParameters::builder().unsharp_radius(-2.0).build()));
    assert!(invalid(EnhancementParameters::builder().unsharp_amount_percent(-1.0).build()));
    assert!(invalid(GuidedFilterParameters::new(5, 0.0)));
    assert!(invalid(EdgePreservingParameters::new(10.0, -0.05, 3)));
    assert!(invalid(ToneGains::new(1.0, 0.0, 1.0)));

    let image = create_minimal_rgb_image();
    assert!(invalid(image.unsharp_mask(2.0, -150.0, 3)));
    assert!(invalid(image.unsharp_mask(f32::NAN, 150.0, 3)));

    let mask = create_minimal_alpha_mask();
    assert!(invalid(enhance_contrast(&mask, -3.0, (8, 8))));
    assert!(invalid(enhance_contrast(&mask, 3.0, (0, 8))));
}

#[test]
fn test_extreme_values_stay_clamped() {
    let image = Image::from_fn(12, 12, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let params = EnhancementParameters::builder()
        .clahe_clip_limit(40.0)
        .unsharp_amount_percent(500.0)
        .unsharp_threshold(0)
        .brightness_gain(3.0)
        .contrast_gain(3.0)
        .sharpness_gain(3.0)
        .build()
        .unwrap();

    // Saturating arithmetic must not wrap around
    let enhanced = preprocess(&image, &params).unwrap();
    assert_eq!(enhanced.dimensions(), (12, 12));
    assert!(enhanced.pixels().any(|p| *p == Rgb([255, 255, 255])));
}

#[test]
fn test_huge_guided_radius_on_small_image() {
    let image = Image::from_fn(5, 4, |x, _| Rgb([(x * 60) as u8, 100, 140]));
    let mask = Image::from_fn(5, 4, |x, _| Luma([if x < 2 { 0 } else { 255 }]));
    let params = GuidedFilterParameters::new(1000, 0.01).unwrap();
    let refined = refine_alpha(&mask, &image, &params).unwrap();
    assert_eq!(refined.dimensions(), (5, 4));
}

#[test]
fn test_extreme_tone_gains() {
    let image = Image::from_pixel(4, 4, Rgb([100u8, 150, 200]));
    let dark = adjust_tone(&image, &ToneGains::new(1e-6, 1.0, 1.0).unwrap()).unwrap();
    assert!(dark.pixels().all(|p| *p == Rgb([0, 0, 0])));

    let bright = adjust_tone(&image, &ToneGains::new(100.0, 1.0, 1.0).unwrap()).unwrap();
    assert!(bright.pixels().all(|p| *p == Rgb([255, 255, 255])));
}
