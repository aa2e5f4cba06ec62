//! # AVIF Thumbnailer
//!
//! Cached, size-normalized thumbnail pairs for raster images: an AVIF variant
//! and a fallback variant in the source's own format, embedded together in a
//! `<picture>` element so browsers pick the best one they support.
//!
//! # Pipeline
//!
//! ```text
//! source + box + mode ──→ cache key (SHA-256) ──→ fresh? ──yes──→ hit
//!                                                   │
//!                                                   no
//!                                                   ↓
//!                   identify ──→ plan crop ──→ fallback (image driver)
//!                                    │
//!                                    └──────→ AVIF (ffmpeg, same plan)
//! ```
//!
//! Both artifacts derive from one [`imaging::CropPlan`], so they have the same
//! geometry even though two unrelated programs produce them. The fallback is
//! mandatory: if it can't be written the request fails. The AVIF is best
//! effort: a failed encode still yields renderable markup.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`thumbnail`] | Orchestration and the outcome model (hit / new / fail / bypass) |
//! | [`cache`] | Cache keys, on-disk and URL layout, freshness, directory creation |
//! | [`imaging`] | Crop/scale planning and the decoding drivers that render the fallback |
//! | [`encoder`] | External AVIF encoder invocation with a timeout |
//! | [`markup`] | `<picture>` rendering with sanitized attributes |
//! | [`config`] | `config.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Cache Layout
//!
//! ```text
//! <cache_path>/<shard>/<digest>.<ext>        fallback
//! <cache_path>/<shard>/<digest>.<ext>.avif   AVIF
//! ```
//!
//! `<shard>` is the first two hex characters of the digest. Artifacts are
//! fresh while their mtime is not older than the source's; there is no
//! eviction.

pub mod cache;
pub mod config;
pub mod encoder;
pub mod imaging;
pub mod markup;
pub mod output;
pub mod thumbnail;

pub use thumbnail::{Thumbnail, ThumbnailError, ThumbnailOutcome, ThumbnailRequest, Thumbnailer};

#[cfg(test)]
pub(crate) mod test_helpers;
