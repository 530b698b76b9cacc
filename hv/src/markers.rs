//! In-template marker scanning
//!
//! Two narrow pattern matches over raw template text. Real parsing is left to
//! the template compiler; these only find:
//!
//! - `{{!< name }}` - the layout a template (or layout) declares
//! - `{{> name }}` - partials referenced from the text

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static LAYOUT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{!<\s+([A-Za-z0-9._\-/]+)\s*\}\}").expect("layout marker pattern is valid"));

static PARTIAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{>\s+([A-Za-z0-9._\-/]+)\s*\}\}").expect("partial marker pattern is valid"));

/// Name of the layout declared by the first `{{!< name }}` marker, if any
pub fn layout_name(raw: &str) -> Option<&str> {
    let name = LAYOUT_MARKER
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    debug!(?name, "layout_name: scanned");
    name
}

/// Names of all partials referenced by `{{> name }}` markers, in order of
/// first appearance
pub fn partial_references(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PARTIAL_MARKER.captures_iter(raw) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    debug!(count = names.len(), "partial_references: scanned");
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_name_found() {
        assert_eq!(layout_name("{{!< main}}\n<p>hi</p>"), Some("main"));
        assert_eq!(layout_name("<p>{{!<   layouts/site-v2.0 }}</p>"), Some("layouts/site-v2.0"));
    }

    #[test]
    fn test_layout_name_first_wins() {
        assert_eq!(layout_name("{{!< one}}{{!< two}}"), Some("one"));
    }

    #[test]
    fn test_layout_name_requires_whitespace() {
        assert_eq!(layout_name("{{!<main}}"), None);
        assert_eq!(layout_name("{{! just a comment }}"), None);
        assert_eq!(layout_name(""), None);
    }

    #[test]
    fn test_partial_references() {
        let raw = "{{> header}}<main>{{> a}}{{> nav/top }}{{> a}}</main>";
        assert_eq!(partial_references(raw), vec!["header", "a", "nav/top"]);
    }

    #[test]
    fn test_partial_references_ignores_other_tags() {
        let raw = "{{name}} {{#if x}}{{/if}} {{!< main}} {{>tight}}";
        assert!(partial_references(raw).is_empty());
    }

    proptest! {
        #[test]
        fn prop_partial_reference_roundtrip(name in "[a-z][a-z0-9_/-]{0,20}") {
            let raw = format!("before {{{{> {} }}}} after", name);
            prop_assert_eq!(partial_references(&raw), vec![name]);
        }

        #[test]
        fn prop_plain_text_has_no_markers(text in "[^{}]*") {
            prop_assert!(layout_name(&text).is_none());
            prop_assert!(partial_references(&text).is_empty());
        }
    }
}
