//! Internal hyperlink resolution.
//!
//! The two output formats use incompatible addressing models:
//! - single-file HTML jumps inside one document (`#fragment`),
//! - EPUB addresses a file per section (`section0003.xhtml#fragment`).
//!
//! Both are derived from the same ordered chapter list. An internal link is
//! any href under the book's address namespace, in either of its two
//! equivalent spellings (absolute `https://host/book/ch1` or site-relative
//! `/book/ch1`). Rewritten links no longer match the namespace, which makes
//! resolution idempotent by construction.

use log::debug;
use markup5ever_rcdom::Handle;

use crate::book::{BookConfig, Chapter};
use crate::dom::{find_all_nodes, get_attr, is_element, set_attr};

/// Number of fixed sections preceding chapter 1 in the EPUB spine
/// (the title page and the table of contents).
pub const FRONT_SECTIONS: usize = 2;

/// Ordinal a lookup miss falls back to: the first content chapter.
pub const DEFAULT_ORDINAL: usize = 1;

/// An internal link split into its base address and in-page fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLink {
    /// Absolute base address, fragment stripped.
    pub path: String,
    pub fragment: Option<String>,
}

/// A resolved address in the target output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAddress {
    /// In-document jump target for single-file HTML output.
    FragmentAnchor(String),
    /// Per-section file address for EPUB output.
    SectionPath {
        section: usize,
        fragment: Option<String>,
    },
}

impl OutputAddress {
    /// Render the address as an href value.
    pub fn href(&self) -> String {
        match self {
            OutputAddress::FragmentAnchor(id) => format!("#{id}"),
            OutputAddress::SectionPath {
                section,
                fragment: None,
            } => format!("section{section:04}.xhtml"),
            OutputAddress::SectionPath {
                section,
                fragment: Some(fragment),
            } => format!("section{section:04}.xhtml#{fragment}"),
        }
    }
}

/// Parse an href as an internal book address.
///
/// Returns `None` for anything outside the book's namespace — external
/// URLs, bare fragments, and links that have already been rewritten.
pub fn parse_internal(href: &str, config: &BookConfig) -> Option<InternalLink> {
    let absolute = config.book_prefix();

    let base = if href.starts_with(&absolute) {
        href.to_string()
    } else if href.starts_with(&config.book_path) {
        format!("{}{}", config.origin, href)
    } else {
        return None;
    };

    match base.split_once('#') {
        Some((path, fragment)) => Some(InternalLink {
            path: path.to_string(),
            fragment: Some(fragment.to_string()),
        }),
        None => Some(InternalLink {
            path: base,
            fragment: None,
        }),
    }
}

/// Resolve an internal link for single-file HTML output: the link's own
/// fragment when it has one, the target chapter's slug otherwise.
pub fn resolve_html(link: &InternalLink, config: &BookConfig) -> OutputAddress {
    match &link.fragment {
        Some(fragment) => OutputAddress::FragmentAnchor(fragment.clone()),
        None => OutputAddress::FragmentAnchor(config.slug(&link.path).to_string()),
    }
}

/// Resolve an internal link for EPUB output: the target chapter's section
/// path, derived from its ordinal. A base address matching no chapter falls
/// back to the first content chapter rather than failing the conversion.
pub fn resolve_epub(
    link: &InternalLink,
    chapters: &[Chapter],
    config: &BookConfig,
) -> OutputAddress {
    let ordinal = chapters
        .iter()
        .find(|c| config.canonical(c.url()) == link.path)
        .map(|c| c.ordinal())
        .unwrap_or_else(|| {
            debug!("no chapter matches {}, using first chapter", link.path);
            DEFAULT_ORDINAL
        });

    OutputAddress::SectionPath {
        section: ordinal + FRONT_SECTIONS,
        fragment: link.fragment.clone(),
    }
}

/// Rewrite every internal link in a subtree to a fragment anchor.
pub fn resolve_links_html(root: &Handle, config: &BookConfig) {
    for (anchor, link) in internal_anchors(root, config) {
        set_attr(&anchor, "href", &resolve_html(&link, config).href());
    }
}

/// Rewrite every internal link in a subtree to a section path.
pub fn resolve_links_epub(root: &Handle, chapters: &[Chapter], config: &BookConfig) {
    for (anchor, link) in internal_anchors(root, config) {
        set_attr(&anchor, "href", &resolve_epub(&link, chapters, config).href());
    }
}

/// Collect the anchors in a subtree whose href is an internal book address.
fn internal_anchors(root: &Handle, config: &BookConfig) -> Vec<(Handle, InternalLink)> {
    find_all_nodes(root, &|n| is_element(n, "a"))
        .into_iter()
        .filter_map(|anchor| {
            let href = get_attr(&anchor, "href")?;
            let link = parse_internal(&href, config)?;
            Some((anchor, link))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, serialize_node};
    use proptest::prelude::*;

    fn config() -> BookConfig {
        BookConfig {
            origin: "https://example.com".into(),
            book_path: "/book/".into(),
            ..BookConfig::default()
        }
    }

    fn chapters() -> Vec<Chapter> {
        vec![
            Chapter::new(0, "https://example.com/book/", "Contents", ""),
            Chapter::new(1, "https://example.com/book/ch1", "One", ""),
            Chapter::new(2, "/book/ch2", "Two", ""),
        ]
    }

    #[test]
    fn test_parse_internal_both_prefix_forms() {
        let config = config();
        let relative = parse_internal("/book/ch1", &config).unwrap();
        let absolute = parse_internal("https://example.com/book/ch1", &config).unwrap();
        assert_eq!(relative, absolute);
        assert_eq!(relative.path, "https://example.com/book/ch1");
        assert_eq!(relative.fragment, None);
    }

    #[test]
    fn test_parse_internal_splits_fragment() {
        let link = parse_internal("/book/ch1#section-2", &config()).unwrap();
        assert_eq!(link.path, "https://example.com/book/ch1");
        assert_eq!(link.fragment.as_deref(), Some("section-2"));
    }

    #[test]
    fn test_parse_internal_rejects_foreign_links() {
        let config = config();
        assert_eq!(parse_internal("https://other.site/page", &config), None);
        assert_eq!(parse_internal("#already-resolved", &config), None);
        assert_eq!(parse_internal("section0003.xhtml", &config), None);
        assert_eq!(parse_internal("mailto:a@b.c", &config), None);
    }

    #[test]
    fn test_html_resolution_prefers_fragment() {
        let config = config();
        let link = parse_internal("/book/ch1#section-2", &config).unwrap();
        assert_eq!(
            resolve_html(&link, &config),
            OutputAddress::FragmentAnchor("section-2".into())
        );
    }

    #[test]
    fn test_html_resolution_falls_back_to_slug() {
        let config = config();
        let link = parse_internal("/book/ch1", &config).unwrap();
        assert_eq!(
            resolve_html(&link, &config),
            OutputAddress::FragmentAnchor("ch1".into())
        );
    }

    #[test]
    fn test_epub_resolution_offsets_ordinal() {
        let config = config();
        let link = parse_internal("/book/ch2#fig-1", &config).unwrap();
        let addr = resolve_epub(&link, &chapters(), &config);
        assert_eq!(addr.href(), "section0004.xhtml#fig-1");
    }

    #[test]
    fn test_epub_resolution_miss_uses_first_chapter() {
        let config = config();
        let link = parse_internal("/book/no-such-chapter", &config).unwrap();
        let addr = resolve_epub(&link, &chapters(), &config);
        assert_eq!(addr.href(), "section0003.xhtml");
    }

    #[test]
    fn test_rewrite_leaves_external_links_alone() {
        let config = config();
        let dom = parse_html(
            r#"<p><a href="/book/ch1">in</a><a href="https://other.site/">out</a></p>"#,
        );
        resolve_links_html(&dom.document, &config);
        let html = serialize_node(&dom.document).unwrap();
        assert!(html.contains("href=\"#ch1\""));
        assert!(html.contains("href=\"https://other.site/\""));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = config();
        let chapters = chapters();
        let dom = parse_html(r#"<a href="/book/ch1#x">x</a><a href="/book/ch2">y</a>"#);

        resolve_links_epub(&dom.document, &chapters, &config);
        let once = serialize_node(&dom.document).unwrap();
        resolve_links_epub(&dom.document, &chapters, &config);
        let twice = serialize_node(&dom.document).unwrap();
        assert_eq!(once, twice);
        assert!(once.contains("href=\"section0003.xhtml#x\""));
        assert!(once.contains("href=\"section0004.xhtml\""));
    }

    proptest! {
        #[test]
        fn prop_resolved_hrefs_never_reparse_as_internal(
            slug in "[a-z0-9-]{1,16}",
            fragment in proptest::option::of("[a-z0-9-]{1,16}")
        ) {
            let config = config();
            let href = match &fragment {
                Some(f) => format!("/book/{slug}#{f}"),
                None => format!("/book/{slug}"),
            };
            let link = parse_internal(&href, &config).unwrap();

            let html_href = resolve_html(&link, &config).href();
            let epub_href = resolve_epub(&link, &chapters(), &config).href();
            prop_assert!(parse_internal(&html_href, &config).is_none());
            prop_assert!(parse_internal(&epub_href, &config).is_none());
        }

        #[test]
        fn prop_epub_section_is_ordinal_plus_offset(ordinal in 1usize..200) {
            let config = config();
            let url = format!("/book/ch{ordinal}");
            let chapters = vec![Chapter::new(ordinal, url.as_str(), "ch", "")];
            let link = parse_internal(&url, &config).unwrap();
            match resolve_epub(&link, &chapters, &config) {
                OutputAddress::SectionPath { section, .. } => {
                    prop_assert_eq!(section, ordinal + FRONT_SECTIONS);
                }
                other => prop_assert!(false, "expected section path, got {:?}", other),
            }
        }
    }
}
