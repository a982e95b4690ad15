//! # bindery
//!
//! Consolidate independently fetched web-book chapter fragments into a
//! single cross-linked HTML page or an EPUB archive.
//!
//! The input is an ordered chapter list (the first element carrying the
//! book's table of contents) plus a stylesheet string; fetching that input
//! is the caller's job. Each chapter is sanitized, its internal hyperlinks
//! are rewritten into the target format's addressing scheme, and — for
//! EPUB output — its images are inlined into the archive.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bindery::{BookConfig, Chapter, Converter, HtmlExporter};
//!
//! let toc_fragment = r#"<div class="toc"><a href="/shapeup/ch1">Chapter 1</a></div>"#;
//! let chapters = vec![
//!     Chapter::new(0, "https://basecamp.com/shapeup/", "Shape Up", toc_fragment),
//!     Chapter::new(1, "https://basecamp.com/shapeup/ch1", "Chapter 1", "<p>...</p>"),
//! ];
//!
//! let exporter = HtmlExporter::new("shape-up-book", BookConfig::default());
//! exporter.convert(&chapters, "body { margin: 0; }")?;
//! # Ok::<(), bindery::Error>(())
//! ```
//!
//! EPUB output additionally needs an [`ImageFetcher`] implementation to
//! retrieve remote images:
//!
//! ```no_run
//! use bindery::{BookConfig, Converter, EpubExporter, FetchedImage, ImageFetcher};
//! # struct Client;
//! # impl ImageFetcher for Client {
//! #     fn fetch(&self, _url: &str) -> std::io::Result<FetchedImage> {
//! #         unimplemented!()
//! #     }
//! # }
//! # let chapters = Vec::new();
//!
//! let exporter = EpubExporter::new("shape-up.epub", BookConfig::default(), Client);
//! exporter.convert(&chapters, "body { margin: 0; }")?;
//! # Ok::<(), bindery::Error>(())
//! ```

pub mod book;
pub mod dom;
pub mod epub;
pub mod error;
pub mod export;
pub mod images;
pub mod links;
pub mod sanitize;
pub mod toc;

pub use book::{BookConfig, Chapter, PartSpec};
pub use epub::{EpubBuilder, EpubMetadata};
pub use error::{Error, Result};
pub use export::{Converter, EpubExporter, HtmlExporter};
pub use images::{FetchedImage, ImageFetcher};
pub use links::OutputAddress;
