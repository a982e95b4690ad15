//! Table-of-contents extraction.
//!
//! The TOC subtree is the source of every chapter address, so a fragment
//! without one is fatal for the whole conversion.

use markup5ever_rcdom::{Handle, RcDom};

use crate::dom::{find_node, has_class, is_element};
use crate::error::{Error, Result};

/// Class marking the table-of-contents container.
pub const TOC_CLASS: &str = "toc";

/// Isolate the table-of-contents subtree from a parsed fragment.
///
/// The returned handle stays attached to the input tree; callers rewrite its
/// links in place and serialize it on its own.
pub fn extract_toc(dom: &RcDom) -> Result<Handle> {
    find_node(&dom.document, &|n| {
        is_element(n, "div") && has_class(n, TOC_CLASS)
    })
    .ok_or(Error::TocNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, serialize_node};

    #[test]
    fn test_extracts_toc_subtree() {
        let dom = parse_html(
            r#"<div class="intro"></div><div class="toc"><ul><li><a href="/book/ch1">One</a></li></ul></div>"#,
        );
        let toc = extract_toc(&dom).unwrap();
        let html = serialize_node(&toc).unwrap();
        assert!(html.starts_with("<div class=\"toc\">"));
        assert!(html.contains("href=\"/book/ch1\""));
    }

    #[test]
    fn test_missing_toc_is_fatal() {
        let dom = parse_html("<div class=\"content\"><p>no toc here</p></div>");
        assert!(matches!(extract_toc(&dom), Err(Error::TocNotFound)));
    }
}
