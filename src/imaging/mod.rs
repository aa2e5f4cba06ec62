//! Image processing for the fallback artifact.
//!
//! | Operation | Where |
//! |---|---|
//! | **Geometry** | [`plan_crop`]: pure crop/scale math shared with the encoder |
//! | **Identify** | [`ImageBackend::identify`] |
//! | **Thumbnail** | [`ImageBackend::thumbnail`]: crop + resize + encode |
//! | **Driver choice** | [`select_backend`]: first available of an ordered list |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] + [`MagickBackend`]
//! - **Driver**: probe-and-create selection among backends
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod driver;
pub mod magick_backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{CropPlan, CropRect, InsetScale, plan_crop};
pub use driver::{Driver, select_backend};
pub use magick_backend::{MagickBackend, MagickFlavor};
pub use operations::{ThumbnailConfig, create_thumbnail, get_dimensions};
pub use params::{FitMode, Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
