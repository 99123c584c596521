//! Test utilities for imageops-matte
//!
//! Shared fixtures and comparison helpers, compiled for unit tests only.

use image::{Luma, Pixel, Primitive, Rgb, Rgba};
use imageproc::definitions::Image;

const SUBJECT_COLOURS: [[u8; 3]; 4] = [
    [220, 180, 150], // skin tone
    [30, 90, 40],    // foliage
    [210, 170, 140], // shaded skin tone
    [40, 100, 200],  // sky
];

const SUBJECT_ALPHA: [u8; 4] = [255, 0, 230, 20];

fn fixture_index(x: u32, y: u32) -> usize {
    (y * 2 + x) as usize
}

/// 2x2 portrait crop: the left column is subject, the right column is background.
pub fn create_test_rgb_image() -> Image<Rgb<u8>> {
    Image::from_fn(2, 2, |x, y| Rgb(SUBJECT_COLOURS[fixture_index(x, y)]))
}

/// The portrait crop with the matching matte in its alpha channel.
pub fn create_test_rgba_image() -> Image<Rgba<u8>> {
    Image::from_fn(2, 2, |x, y| {
        let [r, g, b] = SUBJECT_COLOURS[fixture_index(x, y)];
        Rgba([r, g, b, SUBJECT_ALPHA[fixture_index(x, y)]])
    })
}

/// Raw matte for [`create_test_rgb_image`]: opaque subject, a soft edge below it,
/// transparent background with a little leakage at (1,1).
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    Image::from_fn(2, 2, |x, y| Luma([SUBJECT_ALPHA[fixture_index(x, y)]]))
}

/// Creates an RGB image with smooth horizontal and vertical gradients plus a
/// diagonal colour stripe, large enough to span several CLAHE tiles.
pub fn create_gradient_test_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| {
        let red = (x * 255 / width.max(1)) as u8;
        let green = (y * 255 / height.max(1)) as u8;
        let blue = if (x + y) % 7 < 2 { 220 } else { 40 };
        Rgb([red, green, blue])
    })
}

/// Compares two pixel values with a tolerance for floating-point precision errors.
///
/// # Returns
/// `true` if all subpixel values are within the tolerance, `false` otherwise
pub fn pixels_approx_equal<P>(expected: P, actual: P, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    expected
        .channels()
        .iter()
        .zip(actual.channels())
        .all(|(e, a)| (f32::from(*e) - f32::from(*a)).abs() <= tolerance)
}

/// Compares two images pixel by pixel with a tolerance.
///
/// # Returns
/// `true` if all pixels are within tolerance and dimensions match, `false` otherwise
pub fn images_approx_equal<P>(expected: &Image<P>, actual: &Image<P>, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    expected.dimensions() == actual.dimensions()
        && expected
            .pixels()
            .zip(actual.pixels())
            .all(|(e, a)| pixels_approx_equal(*e, *a, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_share_dimensions() {
        assert_eq!(create_test_rgb_image().dimensions(), (2, 2));
        assert_eq!(create_test_rgba_image().dimensions(), (2, 2));
        assert_eq!(create_test_alpha_mask().dimensions(), (2, 2));
        assert_eq!(create_test_rgba_image().get_pixel(1, 1), &Rgba([40, 100, 200, 20]));
    }

    #[test]
    fn gradient_image_spans_range() {
        let image = create_gradient_test_image(32, 16);
        assert_eq!(image.dimensions(), (32, 16));
        assert_eq!(image.get_pixel(0, 0)[0], 0);
        assert!(image.get_pixel(31, 15)[0] > 240);
    }

    #[test]
    fn tolerance_decides_approximate_equality() {
        let image1 = create_test_rgb_image();
        let mut image2 = create_test_rgb_image();
        image2.put_pixel(0, 0, Rgb([221, 180, 150]));

        assert!(pixels_approx_equal(Rgb([100u8, 150, 200]), Rgb([101, 149, 201]), 1.5));
        assert!(images_approx_equal(&image1, &image2, 1.5));
        assert!(!images_approx_equal(&image1, &image2, 0.5));
    }
}
