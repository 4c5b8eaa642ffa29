//! Pure derivations applied before every persist. These are ordinary
//! functions, not storage hooks: create and update call them explicitly.

use lazy_static::lazy_static;
use regex::Regex;

pub const EXCERPT_MAX_CHARS: usize = 250;

/// URL-safe slug from a title: lowercase, strip everything that is neither
/// alphanumeric nor whitespace, collapse whitespace runs to single hyphens.
/// "My Blog Post!" -> "my-blog-post".
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() {
            pending_hyphen = true;
        }
    }
    slug
}

/// Tag-stripped prefix of the content, used when no excerpt is supplied.
pub fn derive_excerpt(content: &str) -> String {
    lazy_static! {
        static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    }
    let stripped = TAG_RE.replace_all(content, "");
    let prefix: String = stripped.chars().take(EXCERPT_MAX_CHARS).collect();
    format!("{prefix}...")
}

/// An explicit non-blank excerpt wins; anything else falls back to the
/// derived one.
pub fn resolve_excerpt(explicit: Option<&str>, content: &str) -> String {
    match explicit {
        Some(e) if !e.trim().is_empty() => e.trim().to_string(),
        _ => derive_excerpt(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_readme_example() {
        assert_eq!(slugify("My Blog Post!"), "my-blog-post");
    }

    #[test]
    fn slug_is_deterministic() {
        assert_eq!(slugify("Rust & Postgres"), slugify("Rust & Postgres"));
    }

    #[test]
    fn slug_collapses_whitespace_runs() {
        assert_eq!(slugify("  A   Tale\tof   Two\nCities  "), "a-tale-of-two-cities");
    }

    #[test]
    fn slug_strips_punctuation_without_joining_words() {
        assert_eq!(slugify("Rock & Roll"), "rock-roll");
        assert_eq!(slugify("C'est la vie"), "cest-la-vie");
    }

    #[test]
    fn slug_keeps_digits() {
        assert_eq!(slugify("Top 10 Tips for 2025"), "top-10-tips-for-2025");
    }

    #[test]
    fn slug_has_no_leading_or_trailing_hyphen() {
        assert_eq!(slugify("  !!! Hello !!!  "), "hello");
    }

    #[test]
    fn slug_of_only_symbols_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn excerpt_strips_html_tags() {
        let excerpt = derive_excerpt("<p>Hello <strong>world</strong></p>");
        assert_eq!(excerpt, "Hello world...");
    }

    #[test]
    fn excerpt_truncates_to_250_chars() {
        let content = "x".repeat(1000);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn explicit_excerpt_wins() {
        assert_eq!(
            resolve_excerpt(Some("  hand written  "), "<p>content</p>"),
            "hand written"
        );
    }

    #[test]
    fn blank_explicit_excerpt_falls_back_to_derived() {
        assert_eq!(resolve_excerpt(Some("   "), "<p>content</p>"), "content...");
        assert_eq!(resolve_excerpt(None, "<p>content</p>"), "content...");
    }
}
