//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Thumb
//!
//! Markup goes to stdout, one line per source. Per-source failures and the
//! summary go to stderr so the markup stays pipeable:
//!
//! ```text
//! <picture data-cache="new"><source srcset="/assets/thumbnails/3f/3f9a….jpg.avif" type="image/avif" /><img src="/assets/thumbnails/3f/3f9a….jpg" /></picture>
//! photos/broken.png: failed: Image processing failed: Failed to decode …
//!
//! Cache: 0 cached, 1 generated, 0 fallback-only (1 total), 1 error
//! ```
//!
//! With `--json` stdout carries one JSON array instead, holding serialized
//! thumbnails and `{ "source", "error" }` objects in input order.
//!
//! ## Check
//!
//! ```text
//! Cache
//!     Path: assets/thumbnails
//!     URL: /assets/thumbnails
//! Image driver: image
//!     Extensions: jpg, png
//! Encoder: ffmpeg (libaom-av1)
//!     Available: yes
//! ```
//!
//! # Architecture
//!
//! Every function here is pure and returns strings; `main` does the printing.

use crate::cache::CacheStats;
use crate::thumbnail::{Thumbnail, ThumbnailError, ThumbnailOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of one source in a batch, in input order.
pub type BatchResult = (PathBuf, Result<Thumbnail, ThumbnailError>);

/// Fold a batch into cache statistics plus a count of hard errors.
pub fn tally(results: &[BatchResult]) -> (CacheStats, usize) {
    let mut stats = CacheStats::default();
    let mut errors = 0;
    for (_, result) in results {
        match result.as_ref().map(|t| t.outcome) {
            Ok(ThumbnailOutcome::CacheHit) => stats.hit(),
            Ok(ThumbnailOutcome::Generated) => stats.generate(),
            Ok(ThumbnailOutcome::EncodeFailed) => stats.fail(),
            Ok(ThumbnailOutcome::PassThrough | ThumbnailOutcome::SourceMissing) => stats.skip(),
            Err(_) => errors += 1,
        }
    }
    (stats, errors)
}

/// One-line description of a hard failure for `source`.
pub fn format_thumb_error(source: &Path, error: &ThumbnailError) -> String {
    format!("{}: failed: {}", source.display(), error)
}

/// Batch summary line.
///
/// ```text
/// Cache: 2 cached, 1 generated, 0 fallback-only (3 total)
/// Cache: 0 cached, 0 generated, 0 fallback-only (0 total), 2 errors
/// ```
pub fn format_summary(stats: &CacheStats, errors: usize) -> String {
    match errors {
        0 => format!("Cache: {}", stats),
        1 => format!("Cache: {}, 1 error", stats),
        n => format!("Cache: {}, {} errors", stats, n),
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonEntry<'a> {
    Thumbnail(&'a Thumbnail),
    Error { source: &'a Path, error: String },
}

/// Serialize a batch as a pretty JSON array.
pub fn format_json(results: &[BatchResult]) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry<'_>> = results
        .iter()
        .map(|(source, result)| match result {
            Ok(thumb) => JsonEntry::Thumbnail(thumb),
            Err(e) => JsonEntry::Error {
                source,
                error: e.to_string(),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

/// What `check` found on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub cache_path: PathBuf,
    pub cache_url: String,
    /// Selected driver name, or the selection error.
    pub driver: Result<&'static str, String>,
    pub extensions: Vec<String>,
    pub encoder_command: String,
    pub encoder_codec: String,
    pub encoder_available: bool,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.driver.is_ok() && self.encoder_available
    }
}

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![
        "Cache".to_string(),
        format!("    Path: {}", report.cache_path.display()),
        format!("    URL: {}", report.cache_url),
    ];
    match &report.driver {
        Ok(name) => lines.push(format!("Image driver: {}", name)),
        Err(e) => lines.push(format!("Image driver: none ({})", e)),
    }
    lines.push(format!("    Extensions: {}", report.extensions.join(", ")));
    lines.push(format!(
        "Encoder: {} ({})",
        report.encoder_command, report.encoder_codec
    ));
    lines.push(format!(
        "    Available: {}",
        if report.encoder_available { "yes" } else { "no" }
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::BackendError;

    fn thumb(source: &str, outcome: ThumbnailOutcome) -> BatchResult {
        let source = PathBuf::from(source);
        let thumb = Thumbnail {
            source: source.clone(),
            outcome,
            src: "/t/ab/abc.png".into(),
            modern_src: (outcome == ThumbnailOutcome::Generated)
                .then(|| "/t/ab/abc.png.avif".to_string()),
            attributes: vec![],
        };
        (source, Ok(thumb))
    }

    fn failure(source: &str) -> BatchResult {
        (
            PathBuf::from(source),
            Err(ThumbnailError::Imaging(BackendError::DecodeFailed {
                path: PathBuf::from(source),
                message: "bad header".into(),
            })),
        )
    }

    // =========================================================================
    // Batch summary
    // =========================================================================

    #[test]
    fn tally_counts_every_outcome() {
        let results = vec![
            thumb("a.png", ThumbnailOutcome::CacheHit),
            thumb("b.png", ThumbnailOutcome::Generated),
            thumb("c.png", ThumbnailOutcome::EncodeFailed),
            thumb("d.gif", ThumbnailOutcome::PassThrough),
            thumb("e.png", ThumbnailOutcome::SourceMissing),
            failure("f.png"),
        ];
        let (stats, errors) = tally(&results);
        assert_eq!(
            stats,
            CacheStats {
                hits: 1,
                generated: 1,
                failed: 1,
                skipped: 2
            }
        );
        assert_eq!(errors, 1);
    }

    #[test]
    fn summary_pluralizes_errors() {
        let stats = CacheStats {
            hits: 2,
            generated: 1,
            failed: 0,
            skipped: 0,
        };
        assert_eq!(
            format_summary(&stats, 0),
            "Cache: 2 cached, 1 generated, 0 fallback-only (3 total)"
        );
        assert!(format_summary(&stats, 1).ends_with("(3 total), 1 error"));
        assert!(format_summary(&stats, 4).ends_with("(3 total), 4 errors"));
    }

    #[test]
    fn error_line_names_source() {
        let (source, result) = failure("photos/broken.png");
        let line = format_thumb_error(&source, result.as_ref().unwrap_err());
        assert!(line.starts_with("photos/broken.png: failed: "));
        assert!(line.contains("bad header"));
    }

    // =========================================================================
    // JSON
    // =========================================================================

    #[test]
    fn json_keeps_input_order_and_inlines_errors() {
        let results = vec![thumb("a.png", ThumbnailOutcome::Generated), failure("b.png")];
        let json: serde_json::Value = serde_json::from_str(&format_json(&results).unwrap()).unwrap();

        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["outcome"], "generated");
        assert_eq!(entries[0]["modern_src"], "/t/ab/abc.png.avif");
        assert_eq!(entries[1]["source"], "b.png");
        assert!(entries[1]["error"].as_str().unwrap().contains("bad header"));
    }

    // =========================================================================
    // Check
    // =========================================================================

    fn report() -> CheckReport {
        CheckReport {
            cache_path: PathBuf::from("assets/thumbnails"),
            cache_url: "/assets/thumbnails".into(),
            driver: Ok("image"),
            extensions: vec!["jpg".into(), "png".into()],
            encoder_command: "ffmpeg".into(),
            encoder_codec: "libaom-av1".into(),
            encoder_available: true,
        }
    }

    #[test]
    fn check_output_healthy() {
        let report = report();
        assert!(report.is_ok());
        assert_eq!(
            format_check_output(&report),
            vec![
                "Cache",
                "    Path: assets/thumbnails",
                "    URL: /assets/thumbnails",
                "Image driver: image",
                "    Extensions: jpg, png",
                "Encoder: ffmpeg (libaom-av1)",
                "    Available: yes",
            ]
        );
    }

    #[test]
    fn check_output_reports_missing_pieces() {
        let report = CheckReport {
            driver: Err("no driver available".into()),
            encoder_available: false,
            ..report()
        };
        assert!(!report.is_ok());
        let lines = format_check_output(&report);
        assert_eq!(lines[3], "Image driver: none (no driver available)");
        assert_eq!(lines[6], "    Available: no");
    }
}
