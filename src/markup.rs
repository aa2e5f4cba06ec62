//! `<picture>` markup for a [`Thumbnail`].
//!
//! Values are escaped through maud; attribute names can't be expressed in
//! `html!` when they come from the caller, so the element text is assembled
//! by hand around escaped pieces.

use crate::thumbnail::{Thumbnail, ThumbnailOutcome};
use maud::html;

/// Escape text for use inside a double-quoted attribute value.
fn escape(value: &str) -> String {
    html! { (value) }.into_string()
}

/// Strip an attribute name down to `[A-Za-z0-9_-]`.
///
/// Returns `None` for names that end up empty and for `src`, which is always
/// owned by the thumbnail.
pub fn sanitize_attribute_key(key: &str) -> Option<String> {
    let clean: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if clean.is_empty() || clean.eq_ignore_ascii_case("src") {
        None
    } else {
        Some(clean)
    }
}

/// Render the extra attributes as ` key="value"` pairs, leading space included.
pub fn render_attributes(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .filter_map(|(key, value)| {
            sanitize_attribute_key(key).map(|key| format!(" {key}=\"{}\"", escape(value)))
        })
        .collect()
}

/// Render the markup a page should embed for `thumb`.
pub fn picture(thumb: &Thumbnail) -> String {
    let attrs = render_attributes(&thumb.attributes);
    let img = format!("<img src=\"{}\"{attrs} />", escape(&thumb.src));

    match thumb.outcome {
        ThumbnailOutcome::SourceMissing => format!(
            "<img src=\"{}\" alt=\"No File: {}\" />",
            escape(&thumb.src),
            escape(&thumb.source.to_string_lossy())
        ),
        ThumbnailOutcome::PassThrough => img,
        outcome => {
            let state = outcome.cache_state().unwrap_or("fail");
            let source = match &thumb.modern_src {
                Some(url) if outcome != ThumbnailOutcome::EncodeFailed => {
                    format!("<source srcset=\"{}\" type=\"image/avif\" />", escape(url))
                }
                _ => String::new(),
            };
            format!("<picture data-cache=\"{state}\">{source}{img}</picture>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn thumb(outcome: ThumbnailOutcome, modern: Option<&str>) -> Thumbnail {
        Thumbnail {
            source: PathBuf::from("photos/cat.jpg"),
            outcome,
            src: "/t/ab/abc.jpg".into(),
            modern_src: modern.map(String::from),
            attributes: vec![("alt".into(), "A cat".into())],
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn keys_are_stripped_to_safe_charset() {
        assert_eq!(sanitize_attribute_key("data-id"), Some("data-id".into()));
        assert_eq!(sanitize_attribute_key("on<click>"), Some("onclick".into()));
        assert_eq!(sanitize_attribute_key("Class_1"), Some("Class_1".into()));
        assert_eq!(sanitize_attribute_key("\" ><"), None);
    }

    #[test]
    fn src_key_is_dropped_case_insensitively() {
        assert_eq!(sanitize_attribute_key("src"), None);
        assert_eq!(sanitize_attribute_key("SRC"), None);
        assert_eq!(sanitize_attribute_key("s r c"), None);
    }

    #[test]
    fn values_are_escaped() {
        let attrs = vec![("title".to_string(), "a \"b\" <c> & d".to_string())];
        assert_eq!(
            render_attributes(&attrs),
            " title=\"a &quot;b&quot; &lt;c&gt; &amp; d\""
        );
    }

    // =========================================================================
    // Outcomes
    // =========================================================================

    #[test]
    fn generated_includes_avif_source() {
        let html = picture(&thumb(ThumbnailOutcome::Generated, Some("/t/ab/abc.jpg.avif")));
        assert_eq!(
            html,
            "<picture data-cache=\"new\">\
             <source srcset=\"/t/ab/abc.jpg.avif\" type=\"image/avif\" />\
             <img src=\"/t/ab/abc.jpg\" alt=\"A cat\" /></picture>"
        );
    }

    #[test]
    fn cache_hit_marks_hit() {
        let html = picture(&thumb(ThumbnailOutcome::CacheHit, Some("/t/ab/abc.jpg.avif")));
        assert!(html.starts_with("<picture data-cache=\"hit\"><source srcset="));
    }

    #[test]
    fn failed_encode_omits_source() {
        let html = picture(&thumb(ThumbnailOutcome::EncodeFailed, None));
        assert_eq!(
            html,
            "<picture data-cache=\"fail\"><img src=\"/t/ab/abc.jpg\" alt=\"A cat\" /></picture>"
        );
    }

    #[test]
    fn pass_through_is_bare_img() {
        let mut t = thumb(ThumbnailOutcome::PassThrough, None);
        t.src = "photos/anim.gif".into();
        assert_eq!(picture(&t), "<img src=\"photos/anim.gif\" alt=\"A cat\" />");
    }

    #[test]
    fn missing_source_renders_placeholder() {
        let mut t = thumb(ThumbnailOutcome::SourceMissing, None);
        t.src = "#".into();
        t.source = PathBuf::from("photos/<gone>.jpg");
        assert_eq!(
            picture(&t),
            "<img src=\"#\" alt=\"No File: photos/&lt;gone&gt;.jpg\" />"
        );
    }
}
