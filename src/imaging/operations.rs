//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a request, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::plan_crop;
use super::params::{FitMode, Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// Box and policy for one thumbnail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub mode: FitMode,
    pub quality: Quality,
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    source_dims: Dimensions,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        plan: plan_crop(source_dims, (config.width, config.height), config.mode),
        quality: config.quality,
    }
}

/// Render the fallback thumbnail to `output_path`.
///
/// Returns the parameters that were executed so the caller can reuse the
/// same plan for the modern-codec artifact.
pub fn create_thumbnail(
    backend: &dyn ImageBackend,
    source: &Path,
    output_path: &Path,
    source_dims: Dimensions,
    config: &ThumbnailConfig,
) -> Result<ThumbnailParams> {
    let params = plan_thumbnail(source, output_path, source_dims, config);
    backend.thumbnail(&params)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{CropPlan, CropRect, InsetScale};

    fn config(width: u32, height: u32, mode: FitMode) -> ThumbnailConfig {
        ThumbnailConfig {
            width,
            height,
            mode,
            quality: Quality::default(),
        }
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, Dimensions { width: 1920, height: 1080 });
    }

    #[test]
    fn plan_thumbnail_outbound() {
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/thumb.jpg"),
            Dimensions { width: 1200, height: 600 },
            &config(600, 300, FitMode::Outbound),
        );

        assert_eq!(
            params.plan,
            CropPlan::Outbound {
                crop: CropRect { x: 0, y: 0, width: 1200, height: 600 },
                width: 600,
                height: 300,
            }
        );
        assert_eq!(params.quality.value(), 90);
    }

    #[test]
    fn create_thumbnail_uses_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("thumb.png");
        let backend = MockBackend::new();

        let params = create_thumbnail(
            &backend,
            Path::new("/source.png"),
            &output,
            Dimensions { width: 1200, height: 600 },
            &config(300, 600, FitMode::Inset),
        )
        .unwrap();

        assert_eq!(params.plan, CropPlan::Inset(InsetScale::AutoHeight { max_width: 300 }));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Thumbnail { source, quality: 90, .. } if source == "/source.png"
        ));
        assert!(output.exists());
    }
}
