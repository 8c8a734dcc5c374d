//! Image reference rewriting.

use regex::Regex;

/// Rewrite absolute serving-API image references to bundle-relative paths.
///
/// `src="/api/wikis/{wiki}/images/logo.png"` becomes
/// `src="images/logo.png"`, matching the `images/` directory co-bundled
/// with every export. References appear both verbatim in page markup and
/// JSON-escaped (`src=\"...\"`) inside the embedded snapshot; both
/// spellings are rewritten so no reference to the serving host survives.
pub(crate) fn rewrite_image_srcs(html: &str, wiki: &str) -> String {
    let name = regex::escape(wiki);

    // Verbatim markup
    let plain = Regex::new(&format!(r#"src="/api/wikis/{name}/images/([^"]+)""#))
        .unwrap();
    // JSON-escaped markup inside the snapshot
    let escaped = Regex::new(&format!(
        r#"src=\\"/api/wikis/{name}/images/([^"\\]+)\\""#
    ))
    .unwrap();

    let html = plain.replace_all(html, r#"src="images/$1""#);
    escaped
        .replace_all(&html, r#"src=\"images/$1\""#)
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_api_references() {
        let html = r#"<img src="/api/wikis/Demo/images/logo.png" alt="logo">"#;
        assert_eq!(
            rewrite_image_srcs(html, "Demo"),
            r#"<img src="images/logo.png" alt="logo">"#
        );
    }

    #[test]
    fn test_rewrites_json_escaped_references() {
        let html = r#"{"content":"<img src=\"/api/wikis/Demo/images/logo.png\">"}"#;
        assert_eq!(
            rewrite_image_srcs(html, "Demo"),
            r#"{"content":"<img src=\"images/logo.png\">"}"#
        );
    }

    #[test]
    fn test_leaves_other_wikis_and_external_urls() {
        let html = r#"<img src="/api/wikis/Other/images/x.png"><img src="https://example.com/y.png">"#;
        assert_eq!(rewrite_image_srcs(html, "Demo"), html);
    }

    #[test]
    fn test_wiki_name_is_escaped() {
        let html = r#"<img src="/api/wikis/a.b/images/x.png">"#;
        // A dot in the name must not match arbitrary characters
        assert_eq!(
            rewrite_image_srcs(html, "a.b"),
            r#"<img src="images/x.png">"#
        );
        assert_eq!(
            rewrite_image_srcs(r#"<img src="/api/wikis/axb/images/x.png">"#, "a.b"),
            r#"<img src="/api/wikis/axb/images/x.png">"#
        );
    }
}
