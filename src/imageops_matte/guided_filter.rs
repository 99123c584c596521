use crate::error::Error;
use crate::imageops_matte::box_filter::BoxFilter;
use crate::utils::{validate_pair, validate_positive};
use image::{ImageBuffer, Luma, Rgb};
use imageproc::definitions::Image;
use imageproc::map::{map_colors, map_colors2};

/// Trait for guided filtering of a single channel `f32` image
///
/// Inputs and guides are expected on a normalized [0, 1] scale; `epsilon` is expressed
/// on the same scale.
pub trait GuidedFilterExt: Sized {
    /// Filters `self` with a single channel guide
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When the guide size differs from the input
    /// * `Error::InvalidDimensions` - When the input is empty
    /// * `Error::InvalidParameter` - When `epsilon` is not finite and positive
    fn guided_filter(
        &self,
        guidance: &Image<Luma<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, Error>;

    /// Filters `self` with an RGB guide, fitting one linear model per colour channel
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When the guide size differs from the input
    /// * `Error::InvalidDimensions` - When the input is empty
    /// * `Error::InvalidParameter` - When `epsilon` is not finite and positive
    fn guided_filter_with_color_guidance(
        &self,
        guidance: &Image<Rgb<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, Error>;
}

impl GuidedFilterExt for Image<Luma<f32>> {
    fn guided_filter(
        &self,
        guidance: &Image<Luma<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, Error> {
        validate_filter_input(self, guidance, epsilon)?;
        Ok(GuidedFilterGray::new(guidance, radius, epsilon).filter(self))
    }

    fn guided_filter_with_color_guidance(
        &self,
        guidance: &Image<Rgb<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Self, Error> {
        validate_filter_input(self, guidance, epsilon)?;
        Ok(GuidedFilterColor::new(guidance, radius, epsilon).filter(self))
    }
}

fn validate_filter_input<P>(
    input: &Image<Luma<f32>>,
    guidance: &Image<P>,
    epsilon: f32,
) -> Result<(), Error>
where
    P: image::Pixel,
{
    validate_pair(input, guidance)?;
    validate_positive("epsilon", epsilon)
}

fn multiply(lhs: &Image<Luma<f32>>, rhs: &Image<Luma<f32>>) -> Image<Luma<f32>> {
    map_colors2(lhs, rhs, |Luma([l]), Luma([r])| Luma([l * r]))
}

fn channel(image: &Image<Rgb<f32>>, index: usize) -> Image<Luma<f32>> {
    map_colors(image, |Rgb(channels)| Luma([channels[index]]))
}

/// Guided filter steered by a single channel image
pub struct GuidedFilterGray {
    guidance: Image<Luma<f32>>,
    radius: u32,
    epsilon: f32,
    guidance_mean: Image<Luma<f32>>,
    guidance_var: Image<Luma<f32>>,
}

impl GuidedFilterGray {
    pub fn new(guidance: &Image<Luma<f32>>, radius: u32, epsilon: f32) -> Self {
        let guidance_mean = guidance.box_filter_square(radius);
        let guidance_sq_mean = multiply(guidance, guidance).box_filter_square(radius);

        let guidance_var = map_colors2(
            &guidance_mean,
            &guidance_sq_mean,
            |Luma([mean]), Luma([sq_mean])| Luma([mean.mul_add(-mean, sq_mean).max(0.0)]),
        );

        Self {
            guidance: guidance.clone(),
            radius,
            epsilon,
            guidance_mean,
            guidance_var,
        }
    }

    pub fn filter(&self, input: &Image<Luma<f32>>) -> Image<Luma<f32>> {
        let (width, height) = input.dimensions();
        let input_mean = input.box_filter_square(self.radius);
        // E[I * p]
        let input_guidance_mean = multiply(input, &self.guidance).box_filter_square(self.radius);

        let mut a = ImageBuffer::new(width, height);
        let mut b = ImageBuffer::new(width, height);

        for (x, y, a_pixel) in a.enumerate_pixels_mut() {
            let Luma([ip_mean]) = *input_guidance_mean.get_pixel(x, y);
            let Luma([p_mean]) = *input_mean.get_pixel(x, y);
            let Luma([i_mean]) = *self.guidance_mean.get_pixel(x, y);
            let Luma([i_var]) = *self.guidance_var.get_pixel(x, y);

            // cov(I, p) = E[I * p] - E[I] * E[p]
            let cov = i_mean.mul_add(-p_mean, ip_mean);
            let a_val = cov / (i_var + self.epsilon);
            *a_pixel = Luma([a_val]);
            b.put_pixel(x, y, Luma([a_val.mul_add(-i_mean, p_mean)]));
        }

        let a_mean = a.box_filter_square(self.radius);
        let b_mean = b.box_filter_square(self.radius);

        ImageBuffer::from_fn(width, height, |x, y| {
            let Luma([a_val]) = *a_mean.get_pixel(x, y);
            let Luma([b_val]) = *b_mean.get_pixel(x, y);
            let Luma([guide]) = *self.guidance.get_pixel(x, y);
            Luma([a_val.mul_add(guide, b_val)])
        })
    }
}

/// Guided filter steered by an RGB image
///
/// The per-pixel covariance of the three guide channels, regularized with
/// `epsilon * I`, is inverted once at construction so that several inputs can be
/// filtered against the same guide.
pub struct GuidedFilterColor {
    guidance: [Image<Luma<f32>>; 3],
    radius: u32,
    guidance_mean: [Image<Luma<f32>>; 3],
    inv_cov: [Image<Luma<f64>>; 6], // [rr, rg, rb, gg, gb, bb]
}

impl GuidedFilterColor {
    pub fn new(guidance: &Image<Rgb<f32>>, radius: u32, epsilon: f32) -> Self {
        let (width, height) = guidance.dimensions();
        let planes = [channel(guidance, 0), channel(guidance, 1), channel(guidance, 2)];
        let guidance_mean = planes.each_ref().map(|plane| plane.box_filter_square(radius));

        let [r, g, b] = &planes;
        let products = [(r, r), (r, g), (r, b), (g, g), (g, b), (b, b)]
            .map(|(lhs, rhs)| multiply(lhs, rhs).box_filter_square(radius));

        let mut inv_cov: [Image<Luma<f64>>; 6] =
            std::array::from_fn(|_| ImageBuffer::new(width, height));
        let epsilon = f64::from(epsilon);

        for y in 0..height {
            for x in 0..width {
                let mean = guidance_mean
                    .each_ref()
                    .map(|plane| f64::from(plane.get_pixel(x, y)[0]));
                let second = products
                    .each_ref()
                    .map(|plane| f64::from(plane.get_pixel(x, y)[0]));

                // Covariance matrix elements (epsilon added to diagonal)
                let cov_rr = mean[0].mul_add(-mean[0], second[0]).max(0.0) + epsilon;
                let cov_rg = mean[0].mul_add(-mean[1], second[1]);
                let cov_rb = mean[0].mul_add(-mean[2], second[2]);
                let cov_gg = mean[1].mul_add(-mean[1], second[3]).max(0.0) + epsilon;
                let cov_gb = mean[1].mul_add(-mean[2], second[4]);
                let cov_bb = mean[2].mul_add(-mean[2], second[5]).max(0.0) + epsilon;

                // Inverse using cofactor method
                let cof_rr = cov_gg.mul_add(cov_bb, -(cov_gb * cov_gb));
                let cof_rg = cov_rb.mul_add(cov_gb, -(cov_rg * cov_bb));
                let cof_rb = cov_rg.mul_add(cov_gb, -(cov_gg * cov_rb));
                let det = cov_rb.mul_add(cof_rb, cov_rr.mul_add(cof_rr, cov_rg * cof_rg));

                // A covariance plus epsilon * I has det >= epsilon^3. Falling short of
                // that only happens through rounding in the box means.
                let inverse = if det.is_finite() && det >= 0.5 * epsilon.powi(3) {
                    let inv_det = 1.0 / det;
                    [
                        cof_rr,
                        cof_rg,
                        cof_rb,
                        cov_rr.mul_add(cov_bb, -(cov_rb * cov_rb)),
                        cov_rb.mul_add(cov_rg, -(cov_rr * cov_gb)),
                        cov_rr.mul_add(cov_gg, -(cov_rg * cov_rg)),
                    ]
                    .map(|cofactor| cofactor * inv_det)
                } else {
                    [cov_rr.recip(), 0.0, 0.0, cov_gg.recip(), 0.0, cov_bb.recip()]
                };

                for (plane, value) in inv_cov.iter_mut().zip(inverse) {
                    plane.put_pixel(x, y, Luma([value]));
                }
            }
        }

        Self {
            guidance: planes,
            radius,
            guidance_mean,
            inv_cov,
        }
    }

    pub fn filter(&self, input: &Image<Luma<f32>>) -> Image<Luma<f32>> {
        let (width, height) = input.dimensions();
        let radius = self.radius;
        let input_mean = input.box_filter_square(radius);
        let ip_mean = self
            .guidance
            .each_ref()
            .map(|plane| multiply(input, plane).box_filter_square(radius));

        let mut a: [Image<Luma<f32>>; 3] = std::array::from_fn(|_| ImageBuffer::new(width, height));
        let mut b = ImageBuffer::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let Luma([p_mean]) = *input_mean.get_pixel(x, y);
                let mean = self.guidance_mean.each_ref().map(|plane| plane.get_pixel(x, y)[0]);

                let cov_ip: [f64; 3] = std::array::from_fn(|c| {
                    f64::from(p_mean.mul_add(-mean[c], ip_mean[c].get_pixel(x, y)[0]))
                });
                let [inv_rr, inv_rg, inv_rb, inv_gg, inv_gb, inv_bb] =
                    self.inv_cov.each_ref().map(|plane| plane.get_pixel(x, y)[0]);

                // f64: for gray guides the large inverse entries cancel each other
                let [a_r, a_g, a_b] = [
                    inv_rb.mul_add(cov_ip[2], inv_rr.mul_add(cov_ip[0], inv_rg * cov_ip[1])),
                    inv_gb.mul_add(cov_ip[2], inv_rg.mul_add(cov_ip[0], inv_gg * cov_ip[1])),
                    inv_bb.mul_add(cov_ip[2], inv_rb.mul_add(cov_ip[0], inv_gb * cov_ip[1])),
                ]
                .map(|value| value as f32);

                let b_val = a_b.mul_add(
                    -mean[2],
                    a_g.mul_add(-mean[1], a_r.mul_add(-mean[0], p_mean)),
                );

                for (plane, value) in a.iter_mut().zip([a_r, a_g, a_b]) {
                    plane.put_pixel(x, y, Luma([value]));
                }
                b.put_pixel(x, y, Luma([b_val]));
            }
        }

        let a_mean = a.each_ref().map(|plane| plane.box_filter_square(radius));
        let b_mean = b.box_filter_square(radius);

        ImageBuffer::from_fn(width, height, |x, y| {
            let output = (0..3).fold(b_mean.get_pixel(x, y)[0], |acc, c| {
                a_mean[c]
                    .get_pixel(x, y)[0]
                    .mul_add(self.guidance[c].get_pixel(x, y)[0], acc)
            });
            Luma([output])
        })
    }
}
