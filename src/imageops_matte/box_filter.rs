use crate::imageops_matte::summed_area_table::SummedAreaTable;
use image::{ImageBuffer, Luma};
use imageproc::definitions::Image;

/// Trait providing a mean (box) filter backed by a summed-area table
///
/// The cost per pixel is constant regardless of the kernel size. Windows are clipped
/// at the image border and the mean is taken over the pixels actually covered, so any
/// radius is accepted, including radii larger than the image.
pub trait BoxFilter {
    /// Filter output type
    type Output;

    /// Applies a box filter with independent horizontal and vertical radii
    ///
    /// # Arguments
    ///
    /// * `x_radius` - Horizontal radius in pixels
    /// * `y_radius` - Vertical radius in pixels
    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Self::Output;

    /// Applies a box filter with a square `(2 * radius + 1)` kernel
    fn box_filter_square(&self, radius: u32) -> Self::Output {
        self.box_filter(radius, radius)
    }
}

impl BoxFilter for Image<Luma<f32>> {
    type Output = Self;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Self::Output {
        let sat = SummedAreaTable::from_image(self);
        apply_sat_box_filter(&sat, x_radius, y_radius)
    }
}

fn apply_sat_box_filter(sat: &SummedAreaTable, x_radius: u32, y_radius: u32) -> Image<Luma<f32>> {
    let width = sat.width();
    let height = sat.height();
    if width == 0 || height == 0 {
        return ImageBuffer::new(width, height);
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let x1 = x.saturating_sub(x_radius);
        let y1 = y.saturating_sub(y_radius);
        let x2 = x.saturating_add(x_radius).min(width - 1);
        let y2 = y.saturating_add(y_radius).min(height - 1);

        let sum = sat.rectangle_sum(x1, y1, x2, y2);

        // Actual kernel area after clipping at the border
        let area = f64::from(x2 - x1 + 1) * f64::from(y2 - y1 + 1);

        Luma([(sum / area) as f32])
    })
}
