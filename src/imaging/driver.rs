//! Decoding capability selection.
//!
//! The configuration lists drivers in order of preference. Each [`Driver`] is
//! a probe plus a factory; the first driver whose probe succeeds on this host
//! wins. Selection is first-match, not best-match.

use super::backend::{BackendError, ImageBackend};
use super::magick_backend::{MagickBackend, MagickFlavor};
use super::rust_backend::RustBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// Pure Rust `image` crate.
    Image,
    /// ImageMagick 7 CLI (`magick`).
    Imagemagick,
    /// GraphicsMagick CLI (`gm`).
    Graphicsmagick,
}

impl Driver {
    pub fn name(self) -> &'static str {
        match self {
            Driver::Image => "image",
            Driver::Imagemagick => "imagemagick",
            Driver::Graphicsmagick => "graphicsmagick",
        }
    }

    /// Whether this driver can run on the current host.
    pub fn is_available(self, extensions: &[String]) -> bool {
        match self {
            Driver::Image => RustBackend::is_available(extensions),
            Driver::Imagemagick => MagickBackend::is_available(MagickFlavor::ImageMagick),
            Driver::Graphicsmagick => MagickBackend::is_available(MagickFlavor::GraphicsMagick),
        }
    }

    pub fn create(self) -> Box<dyn ImageBackend> {
        match self {
            Driver::Image => Box::new(RustBackend::new()),
            Driver::Imagemagick => Box::new(MagickBackend::new(MagickFlavor::ImageMagick)),
            Driver::Graphicsmagick => Box::new(MagickBackend::new(MagickFlavor::GraphicsMagick)),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First driver in `drivers` accepted by `probe`.
pub fn first_available(drivers: &[Driver], probe: impl Fn(Driver) -> bool) -> Option<Driver> {
    drivers.iter().copied().find(|&driver| {
        let available = probe(driver);
        debug!(driver = driver.name(), available, "probed image driver");
        available
    })
}

/// Instantiate the first available driver.
///
/// Fails with [`BackendError::NoDecodingCapability`] when none of the
/// configured drivers is present on this host.
pub fn select_backend(
    drivers: &[Driver],
    extensions: &[String],
) -> Result<Box<dyn ImageBackend>, BackendError> {
    let driver = first_available(drivers, |d| d.is_available(extensions)).ok_or_else(|| {
        let names: Vec<&str> = drivers.iter().map(|d| d.name()).collect();
        BackendError::NoDecodingCapability(names.join(", "))
    })?;
    info!(driver = driver.name(), "selected image driver");
    Ok(driver.create())
}
