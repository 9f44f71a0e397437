//! Remote asset reference extraction.
//!
//! Scans free-text record fields (mixed HTML/Markdown) and pulls out every
//! distinct remote image reference. Three embedding syntaxes are recognized,
//! independently, within the same text:
//!
//! 1. Image tags with a quoted `src` attribute: `<img src="...">`
//! 2. Well-formed Markdown images: `![alt](url)`
//! 3. A malformed Markdown variant missing its closing bracket: `![alt(url)`
//!
//! Only absolute `http(s)` locators are extracted — relative and
//! protocol-relative locators are already local from the archive's point of
//! view and are silently skipped. Malformed input is never an error; anything
//! that doesn't match a recognized pattern simply isn't extracted.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::Url;

/// `<img ... src="...">` with either quote style.
static IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]+)"|'([^']+)')"#).expect("valid regex")
});

/// Well-formed Markdown image: `![alt](url)`.
static MD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^()\s]+)\)").expect("valid regex"));

/// Malformed Markdown image missing the closing bracket: `![alt(url)`.
/// Only matches when the locator is an absolute http(s) URL; anything else
/// is indistinguishable from ordinary prose and is left alone.
static MD_MALFORMED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]()]*\((https?://[^()\s]+)").expect("valid regex"));

/// Extract the set of distinct remote references embedded in `text`.
///
/// Set semantics: a URL appearing in several matched forms, or several times
/// in one form, is reported once. No ordering is guaranteed.
pub fn extract_references(text: &str) -> HashSet<String> {
    let mut refs = HashSet::new();

    for caps in IMG_TAG_RE.captures_iter(text) {
        let src = caps.get(1).or_else(|| caps.get(2));
        if let Some(src) = src {
            insert_if_remote(&mut refs, src.as_str());
        }
    }

    for caps in MD_IMAGE_RE.captures_iter(text) {
        insert_if_remote(&mut refs, &caps[1]);
    }

    for caps in MD_MALFORMED_RE.captures_iter(text) {
        insert_if_remote(&mut refs, &caps[1]);
    }

    refs
}

/// Treat a "primary image" field as a standalone reference.
///
/// The field carries one bare URL, not embedded markup. Empty or
/// non-remote values yield nothing.
pub fn primary_reference(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if is_remote(trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Keep only locators that parse as absolute http(s) URLs.
fn insert_if_remote(refs: &mut HashSet<String>, candidate: &str) {
    if is_remote(candidate) {
        refs.insert(candidate.to_string());
    } else {
        trace!(candidate, "skipping non-remote locator");
    }
}

fn is_remote(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_img_tag_src() {
        let refs = extract_references(r#"<p>intro</p><img src="http://x/a.png" alt="a">"#);
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("http://x/a.png"));
    }

    #[test]
    fn extracts_single_quoted_src() {
        let refs = extract_references(r#"<img class='hero' src='https://cdn.example.com/b.jpg'>"#);
        assert!(refs.contains("https://cdn.example.com/b.jpg"));
    }

    #[test]
    fn extracts_markdown_image() {
        let refs = extract_references("before ![diagram](https://x.example/d.svg) after");
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("https://x.example/d.svg"));
    }

    #[test]
    fn extracts_malformed_markdown_image() {
        let refs = extract_references("text ![broken(http://x/c.png) more text");
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("http://x/c.png"));
    }

    #[test]
    fn all_three_forms_in_one_blob() {
        let text = r#"<img src="http://x/a.png"> and ![b](http://x/b.png) and ![c(http://x/c.png)"#;
        let refs = extract_references(text);
        let expected: HashSet<String> = [
            "http://x/a.png".to_string(),
            "http://x/b.png".to_string(),
            "http://x/c.png".to_string(),
        ]
        .into();
        assert_eq!(refs, expected);
    }

    #[test]
    fn same_url_in_two_forms_counted_once() {
        let text = r#"<img src="http://x/a.png"> and ![same](http://x/a.png)"#;
        let refs = extract_references(text);
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn repeated_url_counted_once() {
        let text = "![a](http://x/a.png) ![a again](http://x/a.png)";
        assert_eq!(extract_references(text).len(), 1);
    }

    #[test]
    fn relative_locators_skipped() {
        let text = r#"<img src="/local/a.png"> ![rel](../b.png) ![proto](//cdn.example/c.png)"#;
        assert!(extract_references(text).is_empty());
    }

    #[test]
    fn malformed_without_absolute_url_skipped() {
        // Missing bracket *and* not an absolute URL: indistinguishable from
        // prose, so not extracted and not an error.
        let text = "![broken(images/local.png) tail";
        assert!(extract_references(text).is_empty());
    }

    #[test]
    fn non_http_schemes_skipped() {
        let text = r#"<img src="data:image/png;base64,AAAA"> ![f](ftp://host/f.png)"#;
        assert!(extract_references(text).is_empty());
    }

    #[test]
    fn empty_and_garbage_inputs_yield_nothing() {
        assert!(extract_references("").is_empty());
        assert!(extract_references("no images here, just text").is_empty());
        assert!(extract_references("<img src=>![](").is_empty());
        assert!(extract_references("![[[((<img").is_empty());
    }

    #[test]
    fn primary_field_is_a_bare_url() {
        assert_eq!(
            primary_reference("  https://cdn.example.com/cover.jpg "),
            Some("https://cdn.example.com/cover.jpg".to_string())
        );
        assert_eq!(primary_reference(""), None);
        assert_eq!(primary_reference("not a url"), None);
        assert_eq!(primary_reference("/relative/cover.jpg"), None);
    }

    #[test]
    fn query_strings_preserved() {
        let refs = extract_references("![q](https://x.example/img.png?w=800&h=600)");
        assert!(refs.contains("https://x.example/img.png?w=800&h=600"));
    }
}
