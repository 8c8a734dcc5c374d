//! Title to page id conversion.

/// Convert a page title into a slug usable as a page id and HTML anchor.
///
/// Lowercases, keeps alphanumerics, collapses every other run of
/// characters into a single `-`, and trims leading/trailing dashes.
/// Falls back to `"page"` when nothing survives.
///
/// # Examples
///
/// - `"Getting Started"` -> `"getting-started"`
/// - `"  API / Reference  "` -> `"api-reference"`
/// - `"!!!"` -> `"page"`
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        return "page".to_owned();
    }
    slug
}

/// Make `base` unique against `exists` by appending `-2`, `-3`, ...
///
/// The unsuffixed slug is preferred; the suffix counts up from 2 so the
/// second "Specs" page becomes `specs-2`.
pub(crate) fn unique_slug(base: &str, mut exists: impl FnMut(&str) -> bool) -> String {
    if !exists(base) {
        return base.to_owned();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("Introduction"), "introduction");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  API / Reference  "), "api-reference");
        assert_eq!(slugify("a - b -- c"), "a-b-c");
    }

    #[test]
    fn test_slugify_unicode_lowercase() {
        assert_eq!(slugify("Überblick"), "überblick");
        assert_eq!(slugify("Руководство"), "руководство");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), "page");
        assert_eq!(slugify("!!!"), "page");
    }

    #[test]
    fn test_unique_slug_suffixes() {
        let taken = ["specs", "specs-2"];
        let slug = unique_slug("specs", |s| taken.contains(&s));
        assert_eq!(slug, "specs-3");
    }

    #[test]
    fn test_unique_slug_prefers_unsuffixed() {
        assert_eq!(unique_slug("specs", |_| false), "specs");
    }
}
