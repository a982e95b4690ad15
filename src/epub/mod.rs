//! EPUB archive construction.
//!
//! [`EpubBuilder`] is the conversion run's resource ledger: sections and
//! images are registered under keys derived from monotonically increasing
//! counters, so keys are unique for the lifetime of the builder and the
//! spine order is exactly the registration order. [`EpubBuilder::write`]
//! packages the ledger into an EPUB 2 archive (container descriptor, OPF
//! package document, NCX navigation, section documents, resources).

mod writer;

use std::io::{Seek, Write};
use std::path::Path;

use crate::error::Result;

/// Dublin Core metadata for the package document.
#[derive(Debug, Clone, Default)]
pub struct EpubMetadata {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
}

/// A content document in the spine.
#[derive(Debug, Clone)]
pub(crate) struct Section {
    pub(crate) href: String,
    pub(crate) title: String,
    pub(crate) body: String,
}

/// A binary resource (image) registered in the ledger.
#[derive(Debug, Clone)]
pub(crate) struct ImageResource {
    pub(crate) href: String,
    pub(crate) media_type: String,
    pub(crate) data: Vec<u8>,
}

/// Append-only ledger of everything going into one EPUB archive.
#[derive(Debug, Clone, Default)]
pub struct EpubBuilder {
    pub(crate) metadata: EpubMetadata,
    pub(crate) stylesheet: Option<String>,
    pub(crate) sections: Vec<Section>,
    pub(crate) images: Vec<ImageResource>,
    image_counter: usize,
}

/// Href of the shared stylesheet inside the archive.
pub(crate) const STYLESHEET_HREF: &str = "styles.css";

impl EpubBuilder {
    pub fn new(metadata: EpubMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Register the shared stylesheet. Every section document links to it.
    pub fn add_stylesheet(&mut self, css: &str) -> String {
        self.stylesheet = Some(css.to_string());
        STYLESHEET_HREF.to_string()
    }

    /// Append a section to the spine and return its archive path.
    ///
    /// `body` is the section's body markup; it is wrapped into a complete
    /// XHTML document at write time.
    pub fn add_section(&mut self, title: &str, body: &str) -> String {
        let href = format!("section{:04}.xhtml", self.sections.len() + 1);
        self.sections.push(Section {
            href: href.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });
        href
    }

    /// Register image bytes and return the archive path to reference them
    /// by. Keys never collide within one builder.
    pub fn add_image(&mut self, data: Vec<u8>, media_type: &str) -> String {
        self.image_counter += 1;
        let href = format!(
            "images/image_{:04}.{}",
            self.image_counter,
            extension_for(media_type)
        );
        self.images.push(ImageResource {
            href: href.clone(),
            media_type: media_type.to_string(),
            data,
        });
        href
    }

    /// Number of sections registered so far.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Serialize the archive to a file on disk.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    /// Serialize the archive to any `Write + Seek` destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        writer::write_epub(self, writer)
    }
}

/// File extension matching a registered image's media type.
fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_section_keys_follow_registration_order() {
        let mut builder = EpubBuilder::new(EpubMetadata::default());
        assert_eq!(builder.add_section("Title Page", "<p>t</p>"), "section0001.xhtml");
        assert_eq!(builder.add_section("Contents", "<p>c</p>"), "section0002.xhtml");
        assert_eq!(builder.add_section("One", "<p>1</p>"), "section0003.xhtml");
        assert_eq!(builder.section_count(), 3);
    }

    #[test]
    fn test_image_keys_are_unique_and_typed() {
        let mut builder = EpubBuilder::new(EpubMetadata::default());
        let mut keys = HashSet::new();
        for media in ["image/png", "image/jpeg", "image/png", "application/x-unknown"] {
            keys.insert(builder.add_image(vec![0], media));
        }
        assert_eq!(keys.len(), 4);
        assert!(keys.contains("images/image_0001.png"));
        assert!(keys.contains("images/image_0002.jpg"));
        assert!(keys.contains("images/image_0003.png"));
        assert!(keys.contains("images/image_0004.jpg"));
    }
}
