//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! The same [`CropPlan`] drives both artifacts of a thumbnail pair: the raster
//! backend resolves it to pixel dimensions via [`CropPlan::output_size`], and
//! the encoder turns it into a filter expression.

use super::backend::Dimensions;
use super::params::FitMode;

/// Crop rectangle within the source image, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Which axis an inset scale derives automatically from the source aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsetScale {
    /// Height is driven (at most `max_height`, capped at the source height);
    /// width follows the source aspect.
    AutoWidth { max_height: u32 },
    /// Width is driven (at most `max_width`, capped at the source width);
    /// height follows the source aspect.
    AutoHeight { max_width: u32 },
}

/// How to turn a source image into a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPlan {
    /// Crop to the target aspect, then scale to exactly `width` x `height`.
    Outbound {
        crop: CropRect,
        width: u32,
        height: u32,
    },
    /// Scale to fit without cropping.
    Inset(InsetScale),
}

impl CropPlan {
    /// Final pixel dimensions this plan produces for a given source.
    ///
    /// The auto-derived axis is rounded from the source aspect and never
    /// collapses below one pixel.
    pub fn output_size(&self, source: Dimensions) -> Dimensions {
        let aspect = source.width as f64 / source.height as f64;
        match *self {
            CropPlan::Outbound { width, height, .. } => Dimensions { width, height },
            CropPlan::Inset(InsetScale::AutoWidth { max_height }) => {
                let height = max_height.min(source.height);
                let width = ((height as f64 * aspect).round() as u32).max(1);
                Dimensions { width, height }
            }
            CropPlan::Inset(InsetScale::AutoHeight { max_width }) => {
                let width = max_width.min(source.width);
                let height = ((width as f64 / aspect).round() as u32).max(1);
                Dimensions { width, height }
            }
        }
    }
}

/// Compute the crop/scale plan for a source and a target box.
///
/// # Arguments
/// * `source` - Source image dimensions (both non-zero)
/// * `target` - Requested box `(width, height)` (both non-zero)
/// * `mode` - Fitting policy
///
/// # Examples
/// ```
/// # use avif_thumbnailer::imaging::{plan_crop, CropPlan, CropRect, Dimensions, FitMode};
/// let plan = plan_crop(Dimensions { width: 1200, height: 600 }, (600, 300), FitMode::Outbound);
/// assert_eq!(
///     plan,
///     CropPlan::Outbound {
///         crop: CropRect { x: 0, y: 0, width: 1200, height: 600 },
///         width: 600,
///         height: 300,
///     }
/// );
/// ```
pub fn plan_crop(source: Dimensions, target: (u32, u32), mode: FitMode) -> CropPlan {
    let (tgt_w, tgt_h) = target;
    let src_ratio = source.width as f64 / source.height as f64;
    let ratio = tgt_w as f64 / tgt_h as f64;

    match mode {
        FitMode::Outbound => {
            let crop = if ratio > src_ratio {
                // Target is relatively wider: keep full width, trim top and bottom
                let width = source.width;
                let height = ((width as f64 / ratio).round() as u32)
                    .max(tgt_h)
                    .min(source.height);
                CropRect {
                    x: 0,
                    y: centered_offset(source.height, height),
                    width,
                    height,
                }
            } else {
                // Target is relatively taller: keep full height, trim the sides
                let height = source.height;
                let width = ((height as f64 * ratio).round() as u32)
                    .max(tgt_w)
                    .min(source.width);
                CropRect {
                    x: centered_offset(source.width, width),
                    y: 0,
                    width,
                    height,
                }
            };
            CropPlan::Outbound {
                crop,
                width: tgt_w,
                height: tgt_h,
            }
        }
        FitMode::Inset => {
            if ratio > src_ratio {
                CropPlan::Inset(InsetScale::AutoWidth { max_height: tgt_h })
            } else {
                CropPlan::Inset(InsetScale::AutoHeight { max_width: tgt_w })
            }
        }
    }
}

fn centered_offset(full: u32, part: u32) -> u32 {
    ((full - part) as f64 / 2.0).round() as u32
}
