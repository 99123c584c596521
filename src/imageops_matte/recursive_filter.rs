//! Edge-preserving smoothing with the domain-transform recursive filter.
//!
//! Each row and then each column is filtered with a first-order recursive filter whose
//! feedback coefficient shrinks with the local gradient, so smoothing stops at strong
//! edges. Every output sample is a convex combination of input samples and therefore
//! stays inside the input range.

use image::{ImageBuffer, Luma};
use imageproc::definitions::Image;

use crate::error::Error;
use crate::imageops_matte::params::EdgePreservingParameters;
use crate::utils::validate_non_empty_image;

/// Trait for the edge-preserving recursive filter
pub trait EdgePreservingFilterExt: Sized {
    /// Smooths the image while keeping strong edges sharp
    ///
    /// Values are expected on a normalized [0, 1] scale, matching `sigma_range`.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image is empty
    fn edge_preserving_filter(&self, params: &EdgePreservingParameters) -> Result<Self, Error>;
}

impl EdgePreservingFilterExt for Image<Luma<f32>> {
    fn edge_preserving_filter(&self, params: &EdgePreservingParameters) -> Result<Self, Error> {
        let (width, height) = self.dimensions();
        validate_non_empty_image(width, height)?;

        let ratio = params.sigma_spatial() / params.sigma_range();
        let mut horizontal = Plane::from_image(self);
        let mut vertical = horizontal.transposed();

        // Domain transform derivatives; index 0 of every line is unused
        let dx = horizontal.domain_derivative(ratio);
        let dy = vertical.domain_derivative(ratio);

        let iterations = params.iterations();
        for iteration in 0..iterations {
            let feedback = feedback_coefficient(params.sigma_spatial(), iteration, iterations);

            horizontal.filter_lines(&dx, feedback);
            vertical = horizontal.transposed();
            vertical.filter_lines(&dy, feedback);
            horizontal = vertical.transposed();
        }

        ImageBuffer::from_raw(width, height, horizontal.data)
            .ok_or(Error::InvalidDimensions { width, height })
    }
}

/// Feedback coefficient `exp(-sqrt(2) / sigma_h)` of one iteration
///
/// The per-iteration sigma halves every pass so that the variances of all passes add
/// up to `sigma_spatial^2`.
fn feedback_coefficient(sigma_spatial: f32, iteration: u32, iterations: u32) -> f32 {
    let sigma_spatial = f64::from(sigma_spatial);
    let exponent = f64::from(iterations - iteration - 1);
    let sigma_h = sigma_spatial * 3f64.sqrt() * 2f64.powf(exponent)
        / (4f64.powf(f64::from(iterations)) - 1.0).sqrt();
    (-(2f64.sqrt()) / sigma_h).exp() as f32
}

/// Row-major `f32` buffer filtered line by line
struct Plane {
    data: Vec<f32>,
    line_len: usize,
    lines: usize,
}

impl Plane {
    fn from_image(image: &Image<Luma<f32>>) -> Self {
        Self {
            data: image.as_raw().clone(),
            line_len: image.width() as usize,
            lines: image.height() as usize,
        }
    }

    fn transposed(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for (line, values) in self.data.chunks_exact(self.line_len).enumerate() {
            for (offset, &value) in values.iter().enumerate() {
                data[offset * self.lines + line] = value;
            }
        }
        Self {
            data,
            line_len: self.lines,
            lines: self.line_len,
        }
    }

    /// `1 + sigma_s / sigma_r * |I[i] - I[i - 1]|` along each line
    fn domain_derivative(&self, ratio: f32) -> Vec<f32> {
        let mut derivative = vec![1.0; self.data.len()];
        for (values, out) in self
            .data
            .chunks_exact(self.line_len)
            .zip(derivative.chunks_exact_mut(self.line_len))
        {
            for i in 1..values.len() {
                out[i] = ratio.mul_add((values[i] - values[i - 1]).abs(), 1.0);
            }
        }
        derivative
    }

    /// Causal then anti-causal pass over every line
    fn filter_lines(&mut self, derivative: &[f32], feedback: f32) {
        let line_len = self.line_len;
        let filter_line = |(values, distances): (&mut [f32], &[f32])| {
            for i in 1..values.len() {
                let weight = feedback.powf(distances[i]);
                values[i] += weight * (values[i - 1] - values[i]);
            }
            for i in (0..values.len().saturating_sub(1)).rev() {
                let weight = feedback.powf(distances[i + 1]);
                values[i] += weight * (values[i + 1] - values[i]);
            }
        };

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.data
                .par_chunks_exact_mut(line_len)
                .zip(derivative.par_chunks_exact(line_len))
                .for_each(filter_line);
        }
        #[cfg(not(feature = "rayon"))]
        self.data
            .chunks_exact_mut(line_len)
            .zip(derivative.chunks_exact(line_len))
            .for_each(filter_line);
    }
}
