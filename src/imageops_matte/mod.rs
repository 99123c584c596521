pub mod alpha_refine;
pub mod apply_alpha_mask;
pub mod box_filter;
pub mod clahe;
pub mod color_space;
pub mod detail;
pub mod guided_filter;
pub mod matting;
pub mod params;
pub mod pipeline;
pub mod recursive_filter;
pub mod summed_area_table;
pub mod tone;
