//! Chapter and book-profile types.
//!
//! A [`Chapter`] is one fetched fragment of the source book. The fetch
//! collaborator assigns each chapter its ordinal at table-of-contents
//! traversal time: the TOC-bearing fragment is ordinal 0 and the content
//! chapters are numbered 1.. in traversal order. Ordinals and source
//! addresses are the join keys for link resolution and never change after
//! construction.

use std::borrow::Cow;
use std::ops::Range;

/// One addressable unit of book content.
#[derive(Debug, Clone)]
pub struct Chapter {
    ordinal: usize,
    url: String,
    pub title: String,
    pub content: String,
    pub css: Option<String>,
}

impl Chapter {
    pub fn new(
        ordinal: usize,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            url: url.into(),
            title: title.into(),
            content: content.into(),
            css: None,
        }
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Position in traversal order. 0 is the TOC-bearing fragment.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Canonical origin address of this chapter.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A contiguous run of chapters grouped under one part title.
#[derive(Debug, Clone)]
pub struct PartSpec {
    pub title: String,
    /// Ordinal range covered by this part (half-open).
    pub ordinals: Range<usize>,
}

impl PartSpec {
    pub fn new(title: impl Into<String>, ordinals: Range<usize>) -> Self {
        Self {
            title: title.into(),
            ordinals,
        }
    }
}

/// Profile of the book being converted: output metadata, the internal
/// address namespace, and the part structure used when grouping chapters.
///
/// The default profile is the Basecamp "Shape Up" web book, the source this
/// converter was written for. Every field can be overridden for other books
/// with the same fragment structure.
#[derive(Debug, Clone)]
pub struct BookConfig {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    /// Scheme and host of the book's site, e.g. `https://basecamp.com`.
    pub origin: String,
    /// Site-relative path prefix of the book, e.g. `/shapeup/`.
    pub book_path: String,
    /// Cover image address for the EPUB title page, fetched at convert time.
    pub cover_url: Option<String>,
    /// Part grouping table: ordinal ranges, applied in order.
    pub parts: Vec<PartSpec>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: "Shape Up".into(),
            author: "Ryan Singer".into(),
            description: "Stop Running in Circles and Ship Work that Matters".into(),
            language: "en".into(),
            origin: "https://basecamp.com".into(),
            book_path: "/shapeup/".into(),
            cover_url: Some(
                "https://basecamp.com/assets/images/books/shapeup/cover_summary.jpeg".into(),
            ),
            parts: vec![
                PartSpec::new("Introduction", 0..3),
                PartSpec::new("Part 1: Shaping", 3..8),
                PartSpec::new("Part 2: Betting", 8..11),
                PartSpec::new("Part 3: Building", 11..18),
                PartSpec::new("Appendices", 18..usize::MAX),
            ],
        }
    }
}

impl BookConfig {
    /// The absolute form of the internal address prefix,
    /// e.g. `https://basecamp.com/shapeup/`.
    pub fn book_prefix(&self) -> String {
        format!("{}{}", self.origin, self.book_path)
    }

    /// Normalize a site-relative address to its absolute form. Absolute and
    /// site-relative prefixes name the same address namespace.
    pub fn canonical<'a>(&self, addr: &'a str) -> Cow<'a, str> {
        if addr.starts_with('/') {
            Cow::Owned(format!("{}{}", self.origin, addr))
        } else {
            Cow::Borrowed(addr)
        }
    }

    /// The chapter slug: the source address with the book prefix stripped.
    /// Used as the article id (and fragment anchor) in single-file output.
    pub fn slug<'a>(&self, url: &'a str) -> &'a str {
        let s = url.strip_prefix(&self.origin).unwrap_or(url);
        s.strip_prefix(&self.book_path).unwrap_or(s)
    }
}
