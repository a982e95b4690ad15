//! Cross-format addressing: the same chapter list must yield fragment
//! anchors for single-file output and section paths for EPUB output, with
//! referential integrity in both.

use bindery::dom::{find_all_nodes, get_attr, is_element, parse_html, serialize_node};
use bindery::links::{resolve_links_epub, resolve_links_html, FRONT_SECTIONS};
use bindery::{BookConfig, Chapter};

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
        Chapter::new(2, "https://example.com/book/ch2", "Two", ""),
    ]
}

const SUBTREE: &str = r#"<div>
<a href="/book/ch1">plain</a>
<a href="https://example.com/book/ch2#betting">with fragment</a>
<a href="https://elsewhere.example/page">external</a>
</div>"#;

fn hrefs(html: &str) -> Vec<String> {
    let dom = parse_html(html);
    find_all_nodes(&dom.document, &|n| is_element(n, "a"))
        .iter()
        .filter_map(|a| get_attr(a, "href"))
        .collect()
}

#[test]
fn test_html_addressing() {
    let dom = parse_html(SUBTREE);
    resolve_links_html(&dom.document, &config());
    let html = serialize_node(&dom.document).unwrap();

    assert_eq!(
        hrefs(&html),
        ["#ch1", "#betting", "https://elsewhere.example/page"]
    );
}

#[test]
fn test_epub_addressing() {
    let dom = parse_html(SUBTREE);
    resolve_links_epub(&dom.document, &chapters(), &config());
    let html = serialize_node(&dom.document).unwrap();

    assert_eq!(
        hrefs(&html),
        [
            "section0003.xhtml",
            "section0004.xhtml#betting",
            "https://elsewhere.example/page",
        ]
    );
}

#[test]
fn test_section_numbers_track_ordinals() {
    let config = config();
    let chapters = chapters();
    for chapter in chapters.iter().filter(|c| c.ordinal() > 0) {
        let html = format!("<a href=\"{}\">c</a>", chapter.url());
        let dom = parse_html(&html);
        resolve_links_epub(&dom.document, &chapters, &config);
        let resolved = hrefs(&serialize_node(&dom.document).unwrap());
        assert_eq!(
            resolved[0],
            format!("section{:04}.xhtml", chapter.ordinal() + FRONT_SECTIONS)
        );
    }
}

#[test]
fn test_resolution_is_idempotent_across_formats() {
    let config = config();
    let chapters = chapters();

    let dom = parse_html(SUBTREE);
    resolve_links_html(&dom.document, &config);
    let once = serialize_node(&dom.document).unwrap();
    resolve_links_html(&dom.document, &config);
    assert_eq!(serialize_node(&dom.document).unwrap(), once);

    let dom = parse_html(SUBTREE);
    resolve_links_epub(&dom.document, &chapters, &config);
    let once = serialize_node(&dom.document).unwrap();
    resolve_links_epub(&dom.document, &chapters, &config);
    assert_eq!(serialize_node(&dom.document).unwrap(), once);
}

#[test]
fn test_unknown_target_falls_back_to_first_chapter() {
    let dom = parse_html(r#"<a href="/book/retired-chapter">gone</a>"#);
    resolve_links_epub(&dom.document, &chapters(), &config());
    let resolved = hrefs(&serialize_node(&dom.document).unwrap());
    assert_eq!(resolved[0], "section0003.xhtml");
}
