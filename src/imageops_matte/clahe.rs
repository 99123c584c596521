//! Contrast Limited Adaptive Histogram Equalization (CLAHE).
//!
//! The plane is split into a grid of tiles. Each tile gets its own equalization
//! mapping built from a clipped histogram, and every pixel blends the mappings of the
//! four nearest tile centres so that no tile seams show up in the output.
//!
//! A tile whose pixels all share one value has no contrast to stretch and keeps the
//! identity mapping, so flat regions pass through untouched.

use image::{ImageBuffer, Luma};
use imageproc::definitions::Image;

use crate::error::Error;
use crate::imageops_matte::color_space::LIGHTNESS_MAX;
use crate::imageops_matte::params::validate_tile_grid;
use crate::utils::{fill_pixels, round_to_u8, validate_non_empty_image, validate_positive};

const BINS: usize = 256;

/// Trait for applying CLAHE to a single channel 8-bit image
pub trait ClaheExt {
    /// Equalizes the image tile by tile
    ///
    /// # Arguments
    ///
    /// * `clip_limit` - Histogram clip factor relative to a uniform histogram
    /// * `tile_grid` - Number of tiles along (x, y)
    ///
    /// # Errors
    ///
    /// * `Error::InvalidDimensions` - When the image is empty
    /// * `Error::InvalidParameter` - When `clip_limit` is not positive or the grid is zero
    fn clahe(&self, clip_limit: f32, tile_grid: (u32, u32)) -> Result<Image<Luma<u8>>, Error>;
}

impl ClaheExt for Image<Luma<u8>> {
    fn clahe(&self, clip_limit: f32, tile_grid: (u32, u32)) -> Result<Image<Luma<u8>>, Error> {
        enhance_contrast(self, clip_limit, tile_grid)
    }
}

/// Applies CLAHE to an 8-bit single channel image
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the image is empty
/// * `Error::InvalidParameter` - When `clip_limit` is not positive or the grid is zero
pub fn enhance_contrast(
    image: &Image<Luma<u8>>,
    clip_limit: f32,
    tile_grid: (u32, u32),
) -> Result<Image<Luma<u8>>, Error> {
    validate_inputs(image.dimensions(), clip_limit, tile_grid)?;

    let (width, height) = image.dimensions();
    let equalizer = TileEqualizer::new(image, clip_limit, tile_grid);
    let raw = fill_pixels(width, height, 1, |x, y, pixel| {
        let Luma([value]) = *image.get_pixel(x, y);
        pixel[0] = round_to_u8(equalizer.map(x, y, value));
    });

    ImageBuffer::from_raw(width, height, raw).ok_or(Error::InvalidDimensions { width, height })
}

/// Applies CLAHE to an L\* plane with values in [0, 100]
///
/// Histograms are built on the 8-bit quantized lightness, and each pixel keeps its
/// sub-level remainder on top of the mapped level, so a pixel whose tiles map
/// identically comes back bit-exact.
///
/// # Errors
///
/// * `Error::InvalidDimensions` - When the plane is empty
/// * `Error::InvalidParameter` - When `clip_limit` is not positive or the grid is zero
pub fn equalize_lightness(
    lightness: &Image<Luma<f32>>,
    clip_limit: f32,
    tile_grid: (u32, u32),
) -> Result<Image<Luma<f32>>, Error> {
    validate_inputs(lightness.dimensions(), clip_limit, tile_grid)?;

    let (width, height) = lightness.dimensions();
    let scale = f32::from(u8::MAX) / LIGHTNESS_MAX;
    let levels: Image<Luma<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([round_to_u8(lightness.get_pixel(x, y)[0] * scale)])
    });

    let equalizer = TileEqualizer::new(&levels, clip_limit, tile_grid);
    let raw = fill_pixels(width, height, 1, |x, y, pixel| {
        let scaled = lightness.get_pixel(x, y)[0] * scale;
        let Luma([level]) = *levels.get_pixel(x, y);
        let mapped = equalizer.map(x, y, level) + (scaled - f32::from(level));
        pixel[0] = (mapped / scale).clamp(0.0, LIGHTNESS_MAX);
    });

    ImageBuffer::from_raw(width, height, raw).ok_or(Error::InvalidDimensions { width, height })
}

fn validate_inputs(
    (width, height): (u32, u32),
    clip_limit: f32,
    tile_grid: (u32, u32),
) -> Result<(), Error> {
    validate_non_empty_image(width, height)?;
    validate_positive("clip_limit", clip_limit)?;
    validate_tile_grid(tile_grid)
}

/// Interpolation support along one axis: the two neighbouring tiles and the weight
/// of the second one
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisWeight {
    lower: usize,
    upper: usize,
    weight: f32,
}

/// Per-tile lookup tables plus the precomputed interpolation weights
struct TileEqualizer {
    luts: Vec<[f32; BINS]>,
    tiles_x: usize,
    columns: Vec<AxisWeight>,
    rows: Vec<AxisWeight>,
}

impl TileEqualizer {
    fn new(image: &Image<Luma<u8>>, clip_limit: f32, (grid_x, grid_y): (u32, u32)) -> Self {
        let (width, height) = image.dimensions();
        // Never more tiles than pixels along an axis, so no tile is empty
        let x_bounds = tile_bounds(width, grid_x.min(width));
        let y_bounds = tile_bounds(height, grid_y.min(height));

        let mut luts = Vec::with_capacity(x_bounds.len() * y_bounds.len());
        for &(y_start, y_end) in &y_bounds {
            for &(x_start, x_end) in &x_bounds {
                let mut histogram = [0u32; BINS];
                for y in y_start..y_end {
                    for x in x_start..x_end {
                        histogram[usize::from(image.get_pixel(x, y)[0])] += 1;
                    }
                }
                luts.push(clipped_equalization_lut(&histogram, clip_limit));
            }
        }

        Self {
            luts,
            tiles_x: x_bounds.len(),
            columns: axis_weights(width, &x_bounds),
            rows: axis_weights(height, &y_bounds),
        }
    }

    #[inline]
    fn lut(&self, tile_x: usize, tile_y: usize) -> &[f32; BINS] {
        &self.luts[tile_y * self.tiles_x + tile_x]
    }

    /// Mapped value of `level` at pixel (x, y), in [0, 255]
    #[inline]
    fn map(&self, x: u32, y: u32, level: u8) -> f32 {
        let column = self.columns[x as usize];
        let row = self.rows[y as usize];
        let bin = usize::from(level);

        let top = lerp(
            self.lut(column.lower, row.lower)[bin],
            self.lut(column.upper, row.lower)[bin],
            column.weight,
        );
        let bottom = lerp(
            self.lut(column.lower, row.upper)[bin],
            self.lut(column.upper, row.upper)[bin],
            column.weight,
        );
        lerp(top, bottom, row.weight)
    }
}

#[inline]
fn lerp(from: f32, to: f32, weight: f32) -> f32 {
    (to - from).mul_add(weight, from)
}

/// Splits `0..extent` into `tiles` contiguous, non-empty ranges
fn tile_bounds(extent: u32, tiles: u32) -> Vec<(u32, u32)> {
    let extent = u64::from(extent);
    let tiles = u64::from(tiles);
    (0..tiles)
        .map(|i| ((i * extent / tiles) as u32, ((i + 1) * extent / tiles) as u32))
        .collect()
}

/// Finds, for each pixel along an axis, the tile centres on either side of it
///
/// Pixels before the first centre or past the last one snap to that tile.
fn axis_weights(extent: u32, bounds: &[(u32, u32)]) -> Vec<AxisWeight> {
    let centers: Vec<f32> = bounds
        .iter()
        .map(|&(start, end)| (start + end) as f32 / 2.0 - 0.5)
        .collect();
    let last = centers.len() - 1;

    (0..extent)
        .map(|position| {
            let position = position as f32;
            if position <= centers[0] {
                return AxisWeight {
                    lower: 0,
                    upper: 0,
                    weight: 0.0,
                };
            }
            if position >= centers[last] {
                return AxisWeight {
                    lower: last,
                    upper: last,
                    weight: 0.0,
                };
            }
            let lower = centers.partition_point(|&center| center <= position) - 1;
            let upper = lower + 1;
            AxisWeight {
                lower,
                upper,
                weight: (position - centers[lower]) / (centers[upper] - centers[lower]),
            }
        })
        .collect()
}

/// Builds the equalization mapping of one tile
///
/// Bins above `max(1, clip_limit * area / 256)` are cut down and the excess is spread
/// evenly over all bins before accumulating.
fn clipped_equalization_lut(histogram: &[u32; BINS], clip_limit: f32) -> [f32; BINS] {
    let mut lut = [0.0f32; BINS];

    let occupied = histogram.iter().filter(|&&count| count > 0).count();
    if occupied <= 1 {
        for (level, value) in lut.iter_mut().enumerate() {
            *value = level as f32;
        }
        return lut;
    }

    let area: u32 = histogram.iter().sum();
    let clip = (clip_limit * area as f32 / BINS as f32).max(1.0);

    let mut excess = 0.0f32;
    let mut clipped = [0.0f32; BINS];
    for (bin, &count) in clipped.iter_mut().zip(histogram) {
        let count = count as f32;
        if count > clip {
            excess += count - clip;
            *bin = clip;
        } else {
            *bin = count;
        }
    }

    let redistributed = excess / BINS as f32;
    let scale = f32::from(u8::MAX) / area as f32;
    let mut cumulative = 0.0f32;
    for (value, bin) in lut.iter_mut().zip(clipped) {
        cumulative += bin + redistributed;
        *value = (cumulative * scale).min(f32::from(u8::MAX));
    }
    lut
}
