//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every decoding
//! capability must support: identify and thumbnail. Which implementation runs
//! is decided at runtime by [`select_backend`](super::driver::select_backend)
//! from an ordered list of [`Driver`](super::driver::Driver)s.
//!
//! | Driver | Implementation |
//! |---|---|
//! | `image` | [`RustBackend`](super::rust_backend::RustBackend): pure Rust, statically linked |
//! | `imagemagick` | [`MagickBackend`](super::magick_backend::MagickBackend) over `magick` |
//! | `graphicsmagick` | [`MagickBackend`](super::magick_backend::MagickBackend) over `gm` |

use super::params::ThumbnailParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", path.display())]
    DecodeFailed { path: PathBuf, message: String },
    #[error("Failed to write {}: {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },
    #[error("None of the configured image drivers is available: {0}")]
    NoDecodingCapability(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Send + Sync`: one backend instance is selected
/// per [`Thumbnailer`](crate::thumbnail::Thumbnailer) and shared by every
/// request, including parallel ones.
pub trait ImageBackend: Send + Sync {
    /// Short driver name, for logs and `check` output.
    fn name(&self) -> &'static str;

    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Render the fallback thumbnail described by `params`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
