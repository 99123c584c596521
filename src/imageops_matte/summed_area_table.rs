use image::Luma;
use imageproc::definitions::Image;

/// Summed-area table over a single `f32` channel
///
/// The table stores `f64` running sums with one leading row and column of zeros, so
/// that rectangle sums need no border branches. Sums are accumulated in `f64` because
/// the guided filter subtracts nearly equal window means, where `f32` sums over large
/// images lose the precision the regularization term depends on.
pub struct SummedAreaTable {
    data: Vec<f64>,
    width: u32,
    height: u32,
}

impl SummedAreaTable {
    /// Builds the table from a single channel image
    #[must_use]
    pub fn from_image(image: &Image<Luma<f32>>) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize + 1;
        let mut data = vec![0.0f64; stride * (height as usize + 1)];

        for (y, row) in image.as_raw().chunks_exact(width.max(1) as usize).enumerate() {
            let mut row_sum = 0.0f64;
            for (x, &value) in row.iter().enumerate() {
                row_sum += f64::from(value);
                // sat(x, y) = row_sum(x, y) + sat(x, y - 1)
                data[(y + 1) * stride + x + 1] = row_sum + data[y * stride + x + 1];
            }
        }

        Self {
            data,
            width,
            height,
        }
    }

    /// Width of the source image
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source image
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Sum over the inclusive rectangle `[x1, x2] x [y1, y2]`
    ///
    /// Coordinates must lie inside the source image and satisfy `x1 <= x2`, `y1 <= y2`.
    #[inline]
    #[must_use]
    pub fn rectangle_sum(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> f64 {
        let stride = self.width as usize + 1;
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x2 as usize + 1, y2 as usize + 1);
        self.data[y2 * stride + x2] - self.data[y1 * stride + x2] - self.data[y2 * stride + x1]
            + self.data[y1 * stride + x1]
    }
}
