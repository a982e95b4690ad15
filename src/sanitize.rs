//! Chapter sanitization.
//!
//! Source pages carry sidebar navigation, template placeholders, and footers
//! around the actual chapter text, and keep the chapter title in a header
//! region outside the content container. Sanitization reduces a fetched
//! fragment to its content region: noise elements removed, the title pulled
//! in as the first child, and the title's link retargeted at the table of
//! contents of the output document.

use log::debug;
use markup5ever_rcdom::Handle;

use crate::dom::{
    detach, find_all_nodes, find_node, get_attr, has_class, insert_first, is_element, new_element,
    parse_html, replace_node, reparent_children, serialize_node, set_attr,
};
use crate::error::Result;

/// Class marking a chapter's content container.
pub const CONTENT_CLASS: &str = "content";
/// Class marking the chapter title heading in the front-matter region.
pub const TITLE_CLASS: &str = "intro__title";
/// Class of the sidebar-opening book title button.
const BOOK_TITLE_CLASS: &str = "intro__book-title";

/// Tags removed from the content region wholesale.
const NOISE_TAGS: [&str; 3] = ["template", "nav", "footer"];

/// Sanitize one chapter's markup, returning the serialized content region.
///
/// `toc_href` is the address of the table of contents in the target output
/// format (`#toc` for single-file output, the TOC section path for EPUB
/// output); the relocated title links there.
///
/// If the fragment has no content container the original markup is returned
/// unchanged: one renamed wrapper class should not kill a whole conversion,
/// and the later stages operate on any markup.
pub fn sanitize_chapter(content: &str, toc_href: &str) -> Result<String> {
    let dom = parse_html(content);

    let Some(content_div) = find_node(&dom.document, &|n| {
        is_element(n, "div") && has_class(n, CONTENT_CLASS)
    }) else {
        debug!("no content container found, passing chapter through unchanged");
        return Ok(content.to_string());
    };

    for tag in NOISE_TAGS {
        remove_elements(&content_div, tag);
    }

    rewrite_book_title_button(&dom.document, toc_href);

    // The title lives outside the content region on fetched pages; after a
    // first sanitization pass it is already the region's first child.
    if let Some(title) = find_node(&dom.document, &|n| {
        is_element(n, "h1") && has_class(n, TITLE_CLASS)
    }) {
        if let Some(link) = find_node(&title, &|n| is_element(n, "a")) {
            set_attr(&link, "href", toc_href);
        }
        insert_first(&content_div, &title);
    }

    serialize_node(&content_div)
}

/// Remove every descendant element with the given tag name.
fn remove_elements(root: &Handle, tag: &str) {
    for element in find_all_nodes(root, &|n| is_element(n, tag)) {
        detach(&element);
    }
}

/// The source renders the book title as a button that opens a sidebar.
/// Convert it to a plain anchor on the table of contents, keeping its
/// children (icon and label) intact.
fn rewrite_book_title_button(root: &Handle, toc_href: &str) {
    let Some(button) = find_node(root, &|n| {
        is_element(n, "button")
            && has_class(n, BOOK_TITLE_CLASS)
            && get_attr(n, "data-action").is_some()
    }) else {
        return;
    };

    let anchor = new_element(
        "a",
        &[
            ("href", toc_href),
            ("class", "intro__book-title button hidden-print"),
            ("aria-label", "Table of contents"),
        ],
    );
    reparent_children(&button, &anchor);
    replace_node(&button, &anchor);
}
