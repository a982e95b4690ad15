//! Single-file HTML assembly.
//!
//! Produces one `index.html` with the stylesheet and TOC embedded and one
//! `article` per chapter, grouped into the book's parts. Internal links
//! become in-document fragment anchors, so the page is fully navigable
//! offline.

use std::fmt::Write as _;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use crate::book::{BookConfig, Chapter};
use crate::dom::{body, escape_text, parse_html, serialize_children, serialize_node};
use crate::error::{Error, Result};
use crate::export::Converter;
use crate::links::resolve_links_html;
use crate::sanitize::sanitize_chapter;
use crate::toc::extract_toc;

/// Fixed name of the output file inside the output directory.
pub const PAGE_FILENAME: &str = "index.html";

/// Below this many chapters the part table is ignored and everything goes
/// into one group.
const PART_THRESHOLD: usize = 5;

/// Address of the embedded TOC block inside the page.
const TOC_ANCHOR: &str = "#toc";

pub struct HtmlExporter {
    output_dir: PathBuf,
    config: BookConfig,
}

impl HtmlExporter {
    pub fn new(output_dir: impl Into<PathBuf>, config: BookConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
        }
    }

    fn process_chapter(&self, chapter: &Chapter) -> Result<String> {
        let clean = sanitize_chapter(&chapter.content, TOC_ANCHOR)?;
        let dom = parse_html(&clean);
        resolve_links_html(&dom.document, &self.config);
        match body(&dom) {
            Some(body) => serialize_children(&body),
            None => Ok(clean),
        }
    }
}

impl Converter for HtmlExporter {
    fn convert(&self, chapters: &[Chapter], css: &str) -> Result<()> {
        if chapters.is_empty() {
            return Err(Error::NoChapters);
        }

        let first = parse_html(&chapters[0].content);
        let toc = extract_toc(&first)?;
        resolve_links_html(&toc, &self.config);
        let toc_html = serialize_node(&toc)?;

        let mut bodies = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            let processed = self
                .process_chapter(chapter)
                .map_err(|e| Error::for_chapter(&chapter.title, e))?;
            bodies.push(processed);
        }

        let parts = organize_parts(chapters.len(), &self.config);
        let page = render_page(&self.config, css, &toc_html, chapters, &bodies, &parts);

        fs::create_dir_all(&self.output_dir)?;
        fs::write(self.output_dir.join(PAGE_FILENAME), page)?;
        Ok(())
    }
}

/// A rendered group of chapters: part title plus the chapter index range.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Part {
    pub(crate) title: String,
    pub(crate) range: Range<usize>,
}

/// Partition the chapter list into parts.
///
/// Short lists form a single group; otherwise the configured part table is
/// applied, with ranges clamped to the actual chapter count and empty parts
/// dropped.
pub(crate) fn organize_parts(count: usize, config: &BookConfig) -> Vec<Part> {
    if count < PART_THRESHOLD || config.parts.is_empty() {
        return vec![Part {
            title: "Contents".into(),
            range: 0..count,
        }];
    }

    config
        .parts
        .iter()
        .filter_map(|part| {
            let start = part.ordinals.start.min(count);
            let end = part.ordinals.end.min(count);
            (start < end).then(|| Part {
                title: part.title.clone(),
                range: start..end,
            })
        })
        .collect()
}

fn render_page(
    config: &BookConfig,
    css: &str,
    toc_html: &str,
    chapters: &[Chapter],
    bodies: &[String],
    parts: &[Part],
) -> String {
    let mut page = String::new();

    write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n    <meta charset=\"utf-8\">\n    <title>{}</title>\n    <style>{}</style>\n</head>\n<body>\n",
        escape_text(&config.language),
        escape_text(&config.title),
        css
    )
    .unwrap();

    page.push_str("    <div class=\"content\">\n");
    writeln!(
        page,
        "        <h1 class=\"landing-title landing-title--large\">{}</h1>",
        escape_text(&config.title)
    )
    .unwrap();
    writeln!(
        page,
        "        <p class=\"landing-subtitle\">{}</p>",
        escape_text(&config.description)
    )
    .unwrap();
    writeln!(
        page,
        "        <p class=\"landing-author\"><em>by {}</em></p>",
        escape_text(&config.author)
    )
    .unwrap();
    writeln!(page, "        <div id=\"toc\" class=\"toc\">{}</div>", toc_html).unwrap();
    page.push_str("    </div>\n    <main>\n");

    for part in parts {
        if parts.len() > 1 {
            writeln!(
                page,
                "        <section class=\"part\" aria-label=\"{}\">",
                escape_text(&part.title)
            )
            .unwrap();
        } else {
            page.push_str("        <section class=\"part\">\n");
        }

        for i in part.range.clone() {
            writeln!(
                page,
                "            <article id=\"{}\">\n{}\n            </article>",
                escape_text(config.slug(chapters[i].url())),
                bodies[i]
            )
            .unwrap();
        }

        page.push_str("        </section>\n");
    }

    page.push_str("    </main>\n</body>\n</html>\n");
    page
}
