//! Thumbnail orchestration.
//!
//! [`Thumbnailer::thumbnail`] turns one source image and one requested box
//! into a cached thumbnail pair and reports what happened:
//!
//! ```text
//! unsupported extension ──────────────────────────────→ PassThrough
//! source not a file ──────────────────────────────────→ SourceMissing
//! fallback fresh ─────────────────────────────────────→ CacheHit
//! otherwise: mkdir shard → identify → plan → render fallback → encode AVIF
//!            encoder exit 0 ──────────────────────────→ Generated
//!            encoder failed / timed out ──────────────→ EncodeFailed
//! ```
//!
//! Failures that leave no usable artifact (directory, decoding, writing the
//! fallback, starting the encoder) are returned as [`ThumbnailError`]. Such a
//! failure removes whatever it wrote into the cache, so the next request
//! tries again instead of hitting a broken entry. A failed encode still leaves
//! a valid fallback, so it is only an outcome.
//!
//! A failed encode is not retried until the source changes: the fallback is
//! fresh, so the next request is a cache hit. A hit only advertises the AVIF
//! when the file is actually there.

use crate::cache::{CacheKey, CacheLayout, ensure_dir, is_fresh, normalize_extension};
use crate::config::ThumbnailerConfig;
use crate::encoder::{EncodeJob, EncoderError, FfmpegEncoder, ModernEncoder};
use crate::imaging::{
    BackendError, FitMode, ImageBackend, Quality, ThumbnailConfig, create_thumbnail,
    get_dimensions, select_backend,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reference emitted when the source file does not exist.
pub const PLACEHOLDER_URL: &str = "#";

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Invalid thumbnail size {width}x{height}: both dimensions must be positive")]
    InvalidRequest { width: u32, height: u32 },
    #[error("Source image {} has zero area", path.display())]
    EmptySource { path: PathBuf },
    #[error("Directory \"{}\" was not created: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

/// Requested box, fitting policy and pass-through display attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub width: u32,
    pub height: u32,
    pub mode: FitMode,
    /// Forwarded untouched to the result for the markup layer.
    pub attributes: Vec<(String, String)>,
}

impl ThumbnailRequest {
    pub fn new(width: u32, height: u32, mode: FitMode) -> Self {
        Self {
            width,
            height,
            mode,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbnailOutcome {
    /// Extension not processable; the original file is referenced as-is.
    PassThrough,
    /// Source does not exist; a placeholder is referenced.
    SourceMissing,
    /// Existing artifacts reused.
    CacheHit,
    /// Fallback and AVIF freshly written.
    Generated,
    /// Fallback written, AVIF missing.
    EncodeFailed,
}

impl ThumbnailOutcome {
    /// Value of the `data-cache` markup attribute, for cached outcomes.
    pub fn cache_state(self) -> Option<&'static str> {
        match self {
            ThumbnailOutcome::CacheHit => Some("hit"),
            ThumbnailOutcome::Generated => Some("new"),
            ThumbnailOutcome::EncodeFailed => Some("fail"),
            ThumbnailOutcome::PassThrough | ThumbnailOutcome::SourceMissing => None,
        }
    }
}

/// What a caller needs to render one thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub source: PathBuf,
    pub outcome: ThumbnailOutcome,
    /// Fallback URL, the original path for pass-through, or [`PLACEHOLDER_URL`].
    pub src: String,
    /// AVIF URL; only set when the AVIF is expected to exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modern_src: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

/// Thumbnail pipeline bound to one configuration.
///
/// The decoding backend is chosen on the first generation and shared by all
/// later requests; `Thumbnailer` is `Sync` and may serve requests in parallel.
pub struct Thumbnailer {
    config: ThumbnailerConfig,
    /// `config.extensions`, normalized once.
    extensions: Vec<String>,
    layout: CacheLayout,
    backend: OnceLock<Arc<dyn ImageBackend>>,
    encoder: Arc<dyn ModernEncoder>,
}

impl Thumbnailer {
    pub fn new(config: ThumbnailerConfig) -> Self {
        let encoder = FfmpegEncoder::new(
            config.encoder.command.clone(),
            config.encoder.codec.clone(),
            config.encoder.timeout(),
        );
        Self {
            layout: CacheLayout::new(config.cache_path.clone(), config.cache_url.clone()),
            extensions: config.normalized_extensions(),
            config,
            backend: OnceLock::new(),
            encoder: Arc::new(encoder),
        }
    }

    /// Use `backend` instead of selecting one from the configured drivers.
    pub fn with_backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = OnceLock::from(backend);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ModernEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ThumbnailerConfig {
        &self.config
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Whether a normalized extension is thumbnailed.
    pub fn is_processable(&self, extension: &str) -> bool {
        !extension.is_empty() && self.extensions.iter().any(|e| e == extension)
    }

    /// The decoding backend, selecting it on first use.
    pub fn backend(&self) -> Result<&dyn ImageBackend, ThumbnailError> {
        if let Some(backend) = self.backend.get() {
            return Ok(&**backend);
        }
        let selected: Arc<dyn ImageBackend> =
            Arc::from(select_backend(&self.config.drivers, &self.extensions)?);
        // A concurrent first call may have won; either choice is equivalent
        Ok(&**self.backend.get_or_init(|| selected))
    }

    /// Produce (or reuse) the thumbnail pair for `source`.
    pub fn thumbnail(
        &self,
        source: &Path,
        request: &ThumbnailRequest,
    ) -> Result<Thumbnail, ThumbnailError> {
        if request.width == 0 || request.height == 0 {
            return Err(ThumbnailError::InvalidRequest {
                width: request.width,
                height: request.height,
            });
        }

        let result = |outcome, src: String, modern_src| Thumbnail {
            source: source.to_path_buf(),
            outcome,
            src,
            modern_src,
            attributes: request.attributes.clone(),
        };

        let extension = normalize_extension(source);
        if !self.is_processable(&extension) {
            debug!(source = %source.display(), extension = %extension, "extension not processable, passing through");
            return Ok(result(
                ThumbnailOutcome::PassThrough,
                source.to_string_lossy().to_string(),
                None,
            ));
        }

        if !source.is_file() {
            warn!(source = %source.display(), "source image not found");
            return Ok(result(
                ThumbnailOutcome::SourceMissing,
                PLACEHOLDER_URL.to_string(),
                None,
            ));
        }

        let key = CacheKey::new(
            source,
            request.width,
            request.height,
            request.mode,
            &extension,
        );
        let codec_ext = self.encoder.extension();
        let src = self.layout.fallback_url(&key);
        let modern_src = self.layout.modern_url(&key, codec_ext);

        if is_fresh(&self.layout.fallback_path(&key), source) {
            let has_modern = self.layout.modern_path(&key, codec_ext).is_file();
            debug!(source = %source.display(), %key, has_modern, "cache hit");
            return Ok(result(
                ThumbnailOutcome::CacheHit,
                src,
                has_modern.then_some(modern_src),
            ));
        }

        let outcome = self.generate(source, &key, request)?;
        let modern_src = (outcome == ThumbnailOutcome::Generated).then_some(modern_src);
        Ok(result(outcome, src, modern_src))
    }

    fn generate(
        &self,
        source: &Path,
        key: &CacheKey,
        request: &ThumbnailRequest,
    ) -> Result<ThumbnailOutcome, ThumbnailError> {
        let shard_dir = self.layout.shard_dir(key);
        ensure_dir(&shard_dir, self.config.dir_mode).map_err(|source| {
            ThumbnailError::DirectoryCreationFailed {
                path: shard_dir.clone(),
                source,
            }
        })?;

        let backend = self.backend()?;
        let dims = get_dimensions(backend, source)?;
        if dims.is_empty() {
            return Err(ThumbnailError::EmptySource {
                path: source.to_path_buf(),
            });
        }

        let fallback_path = self.layout.fallback_path(key);
        let params = create_thumbnail(
            backend,
            source,
            &fallback_path,
            dims,
            &ThumbnailConfig {
                width: request.width,
                height: request.height,
                mode: request.mode,
                quality: Quality::new(self.config.quality),
            },
        )
        .inspect_err(|_| discard(&fallback_path))?;

        let modern_path = self.layout.modern_path(key, self.encoder.extension());
        let status = self
            .encoder
            .encode(&EncodeJob {
                source,
                output: &modern_path,
                plan: params.plan,
            })
            .inspect_err(|_| {
                // A fresh fallback alone would turn every retry into a hit
                discard(&modern_path);
                discard(&fallback_path);
            })?;

        if status.is_success() {
            info!(
                source = %source.display(),
                %key,
                backend = backend.name(),
                width = request.width,
                height = request.height,
                mode = %request.mode,
                "generated thumbnail pair"
            );
            Ok(ThumbnailOutcome::Generated)
        } else {
            warn!(source = %source.display(), %key, ?status, "AVIF encode failed, serving fallback only");
            discard(&modern_path);
            Ok(ThumbnailOutcome::EncodeFailed)
        }
    }
}

/// Remove a possibly partial cache artifact.
fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "could not remove cache artifact");
    }
}
