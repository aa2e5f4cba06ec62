//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary, so this driver is always
//! available for the formats compiled into the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with configured quality |
//! | Encode others | `image::DynamicImage::save_with_format` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::CropPlan;
use super::params::{Quality, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders this crate may be built with.
const DECODER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    DECODER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }

    /// Probe: usable when any of the processable extensions can be decoded.
    pub fn is_available(extensions: &[String]) -> bool {
        extensions
            .iter()
            .any(|ext| supported_input_extensions().contains(&ext.as_str()))
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let decode_failed = |message: String| BackendError::DecodeFailed {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| decode_failed(e.to_string()))
}

/// Apply a crop plan to a decoded image.
fn apply_plan(img: &DynamicImage, plan: &CropPlan) -> DynamicImage {
    let size = plan.output_size(Dimensions {
        width: img.width(),
        height: img.height(),
    });
    match plan {
        CropPlan::Outbound { crop, .. } => img
            .crop_imm(crop.x, crop.y, crop.width, crop.height)
            .resize_exact(size.width, size.height, FilterType::Lanczos3),
        CropPlan::Inset(_) => img.resize_exact(size.width, size.height, FilterType::Lanczos3),
    }
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let write_failed = |message: String| BackendError::WriteFailed {
        path: path.to_path_buf(),
        message,
    };
    let format = ImageFormat::from_path(path).map_err(|e| write_failed(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path).map_err(|e| write_failed(e.to_string()))?;
            let writer = std::io::BufWriter::new(file);
            // Quality is clamped to 1-100, so the cast is lossless
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                writer,
                quality.value() as u8,
            );
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| write_failed(e.to_string()))
        }
        other => img
            .save_with_format(path, other)
            .map_err(|e| write_failed(e.to_string())),
    }
}

impl ImageBackend for RustBackend {
    fn name(&self) -> &'static str {
        "image"
    }

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| BackendError::DecodeFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let thumb = apply_plan(&img, &params.plan);
        save_image(&thumb, &params.output, params.quality)
    }
}
