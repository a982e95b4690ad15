//! EPUB archive assembly.
//!
//! Sections are registered in spine order: title page, table of contents,
//! then one section per content chapter. The TOC-bearing fragment (ordinal
//! 0) exists only to supply the TOC subtree and is not re-added as a
//! content section, which keeps chapter ordinals aligned with their section
//! numbers.

use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::warn;

use crate::book::{BookConfig, Chapter};
use crate::dom::{body, escape_text, parse_html, serialize_children, serialize_node};
use crate::epub::{EpubBuilder, EpubMetadata};
use crate::error::{Error, Result};
use crate::export::Converter;
use crate::images::{inline_images, media_type_for_url, ImageFetcher};
use crate::links::resolve_links_epub;
use crate::sanitize::sanitize_chapter;
use crate::toc::extract_toc;

pub struct EpubExporter<F> {
    output_path: PathBuf,
    config: BookConfig,
    fetcher: F,
}

impl<F: ImageFetcher> EpubExporter<F> {
    /// Create an exporter writing to `output_path`. The `.epub` extension
    /// is appended if missing.
    pub fn new(output_path: impl Into<PathBuf>, config: BookConfig, fetcher: F) -> Self {
        let mut path = output_path.into();
        if path.extension() != Some(OsStr::new("epub")) {
            let mut os = path.into_os_string();
            os.push(".epub");
            path = os.into();
        }

        Self {
            output_path: path,
            config,
            fetcher,
        }
    }

    /// The normalized path the archive will be written to.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn process_chapter(
        &self,
        chapter: &Chapter,
        chapters: &[Chapter],
        builder: &mut EpubBuilder,
        toc_href: &str,
    ) -> Result<String> {
        let clean = sanitize_chapter(&chapter.content, toc_href)?;
        let dom = parse_html(&clean);
        resolve_links_epub(&dom.document, chapters, &self.config);
        inline_images(&dom.document, builder, &self.fetcher);
        match body(&dom) {
            Some(body) => serialize_children(&body),
            None => Ok(clean),
        }
    }

    /// Build the title page body, embedding the cover image when it can be
    /// fetched. A cover failure degrades to a text-only title page.
    fn title_page(&self, builder: &mut EpubBuilder) -> String {
        let cover = self.config.cover_url.as_deref().and_then(|url| {
            match self.fetcher.fetch(url) {
                Ok(image) => {
                    let media_type = image
                        .media_type
                        .filter(|m| !m.is_empty())
                        .or_else(|| media_type_for_url(url).map(str::to_string))
                        .unwrap_or_else(|| "image/jpeg".to_string());
                    Some(builder.add_image(image.data, &media_type))
                }
                Err(err) => {
                    warn!("cover fetch failed for {url}: {err}");
                    None
                }
            }
        });

        let mut page = String::from(
            "<div class=\"content\" style=\"display: flex; flex-direction: column; justify-content: center; align-items: center; min-height: 100vh;\">\n",
        );
        if let Some(src) = cover {
            writeln!(
                page,
                "  <img src=\"{}\" alt=\"{} cover\" style=\"max-width: 80%; margin-bottom: 2em;\"/>",
                src,
                escape_text(&self.config.title)
            )
            .unwrap();
        }
        page.push_str("  <div style=\"width: 80%; text-align: left;\">\n");
        writeln!(
            page,
            "    <h1 class=\"landing-title landing-title--large\">{}</h1>",
            escape_text(&self.config.title)
        )
        .unwrap();
        writeln!(
            page,
            "    <p class=\"landing-subtitle\">{}</p>",
            escape_text(&self.config.description)
        )
        .unwrap();
        writeln!(
            page,
            "    <p class=\"landing-author\"><em>by {}</em></p>",
            escape_text(&self.config.author)
        )
        .unwrap();
        page.push_str("  </div>\n</div>");
        page
    }
}

impl<F: ImageFetcher> Converter for EpubExporter<F> {
    fn convert(&self, chapters: &[Chapter], css: &str) -> Result<()> {
        if chapters.is_empty() {
            return Err(Error::NoChapters);
        }

        let mut builder = EpubBuilder::new(EpubMetadata {
            title: self.config.title.clone(),
            author: self.config.author.clone(),
            description: self.config.description.clone(),
            language: self.config.language.clone(),
        });
        builder.add_stylesheet(css);

        let title_body = self.title_page(&mut builder);
        builder.add_section("Title Page", &title_body);

        let first = parse_html(&chapters[0].content);
        let toc = extract_toc(&first)?;
        resolve_links_epub(&toc, chapters, &self.config);
        let toc_href = builder.add_section("Table of Contents", &serialize_node(&toc)?);

        for chapter in chapters.iter().filter(|c| c.ordinal() > 0) {
            let section_body = self
                .process_chapter(chapter, chapters, &mut builder, &toc_href)
                .map_err(|e| Error::for_chapter(&chapter.title, e))?;
            builder.add_section(&chapter.title, &section_body);
        }

        builder.write(&self.output_path)
    }
}
