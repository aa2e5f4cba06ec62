//! Thumbnail cache: keys, layout and freshness.
//!
//! Encoding is the bottleneck of the pipeline: an AV1 still-picture encode
//! can take seconds. This module decides where a thumbnail pair lives on disk
//! and whether an existing pair can be reused.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **request-addressed**: a [`CacheKey`] is the SHA-256 of the
//! source path, the requested box and the fitting mode. Identical requests
//! always map to the same files, so concurrent requests for different keys
//! never touch each other's artifacts, and concurrent misses for the same key
//! write identical content (last writer wins).
//!
//! ## Layout
//!
//! ```text
//! <cache_path>/
//! └── 3f/                                  # two-char shard of the digest
//!     ├── 3fa9…e1.jpg                       # fallback artifact
//!     └── 3fa9…e1.jpg.avif                  # modern-codec artifact
//! ```
//!
//! The same relative structure is exposed under the public `cache_url`.
//!
//! ## Invalidation
//!
//! There is no explicit invalidation. A cached fallback is reused while its
//! modification time is not earlier than the source's ([`is_fresh`]); touching
//! or replacing the source regenerates both artifacts on the next request.

use crate::imaging::FitMode;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::path::{Path, PathBuf};

/// Length of the shard directory name taken from the digest.
const SHARD_LEN: usize = 2;

/// Lowercased extension of `path`, with `jpeg` folded into `jpg`.
///
/// A path without an extension yields the empty string.
pub fn normalize_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext == "jpeg" { "jpg".to_string() } else { ext }
}

/// Stable identity of one thumbnail request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: String,
    extension: String,
}

impl CacheKey {
    /// Derive the key for `source` at `width` x `height` in `mode`.
    ///
    /// `extension` is the normalized source extension; it names the fallback
    /// artifact, which keeps the source's format.
    pub fn new(source: &Path, width: u32, height: u32, mode: FitMode, extension: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_os_str().as_encoded_bytes());
        hasher.update(format!("|{}|{}|{}", width, height, mode.as_str()));
        Self {
            digest: format!("{:x}", hasher.finalize()),
            extension: extension.to_string(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Sub-directory bounding per-directory fan-out.
    pub fn shard(&self) -> &str {
        &self.digest[..SHARD_LEN]
    }

    /// `<digest>.<ext>`: the fallback artifact.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.digest, self.extension)
    }

    /// `<digest>.<ext>.<codec_ext>`: the modern-codec artifact.
    pub fn modern_file_name(&self, codec_extension: &str) -> String {
        format!("{}.{}", self.file_name(), codec_extension)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shard(), self.file_name())
    }
}

/// Where artifacts live on disk and under which public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    pub root: PathBuf,
    pub url: String,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn shard_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.shard())
    }

    pub fn fallback_path(&self, key: &CacheKey) -> PathBuf {
        self.shard_dir(key).join(key.file_name())
    }

    pub fn modern_path(&self, key: &CacheKey, codec_extension: &str) -> PathBuf {
        self.shard_dir(key).join(key.modern_file_name(codec_extension))
    }

    pub fn fallback_url(&self, key: &CacheKey) -> String {
        format!(
            "{}/{}/{}",
            self.url.trim_end_matches('/'),
            key.shard(),
            key.file_name()
        )
    }

    pub fn modern_url(&self, key: &CacheKey, codec_extension: &str) -> String {
        format!("{}.{}", self.fallback_url(key), codec_extension)
    }
}

/// Whether `artifact` exists and is not older than `source`.
///
/// Any stat failure counts as stale.
pub fn is_fresh(artifact: &Path, source: &Path) -> bool {
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified());
    match (modified(artifact), modified(source)) {
        (Ok(artifact_time), Ok(source_time)) => artifact_time >= source_time,
        _ => false,
    }
}

/// Create `dir` (and parents) with `mode` unless it already exists.
///
/// Another request may create the same directory between the existence check
/// and the create call; that lost race is not an error.
pub fn ensure_dir(dir: &Path, mode: u32) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    match builder.create(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Summary of cache outcomes for a batch of requests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub generated: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn generate(&mut self) {
        self.generated += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.generated + self.failed + self.skipped
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} generated, {} fallback-only",
            self.hits, self.generated, self.failed
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
