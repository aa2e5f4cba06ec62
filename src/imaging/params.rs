//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which plans the thumbnail) and the [`backend`](super::backend) (which does
//! the actual pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`FitMode`]: Inset (letterbox) or outbound (fill + crop).
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ThumbnailParams`]: Full specification for a thumbnail: source, output, plan, quality.

use super::calculations::CropPlan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fitting policy for a thumbnail box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to fit inside the box, no cropping.
    #[default]
    Inset,
    /// Crop to the box aspect, then scale to fill it exactly.
    Outbound,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FitMode::Inset => "inset",
            FitMode::Outbound => "outbound",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a fallback thumbnail render.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Destination; the output format follows its extension.
    pub output: PathBuf,
    pub plan: CropPlan,
    pub quality: Quality,
}
