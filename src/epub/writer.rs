use std::fmt::Write as _;
use std::io::{Seek, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{EpubBuilder, STYLESHEET_HREF};
use crate::dom::escape_text;
use crate::error::Result;

/// Package a builder's ledger into a valid EPUB 2 archive.
pub(super) fn write_epub<W: Write + Seek>(builder: &EpubBuilder, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    // The mimetype entry must come first and stay uncompressed.
    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    let identifier = format!("urn:uuid:{}", uuid_v4());

    let opf = generate_opf(builder, &identifier);
    zip.start_file("OEBPS/content.opf", options_deflate)?;
    zip.write_all(opf.as_bytes())?;

    let ncx = generate_ncx(builder, &identifier);
    zip.start_file("OEBPS/toc.ncx", options_deflate)?;
    zip.write_all(ncx.as_bytes())?;

    if let Some(ref css) = builder.stylesheet {
        zip.start_file(format!("OEBPS/{}", STYLESHEET_HREF), options_deflate)?;
        zip.write_all(css.as_bytes())?;
    }

    for section in &builder.sections {
        let document = section_document(builder, &section.title, &section.body);
        zip.start_file(format!("OEBPS/{}", section.href), options_deflate)?;
        zip.write_all(document.as_bytes())?;
    }

    for image in &builder.images {
        zip.start_file(format!("OEBPS/{}", image.href), options_deflate)?;
        zip.write_all(&image.data)?;
    }

    zip.finish()?;
    Ok(())
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Wrap a section body into a complete XHTML content document.
fn section_document(builder: &EpubBuilder, title: &str, body: &str) -> String {
    let mut doc = String::new();

    doc.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8"/>
  <title>"#,
    );
    doc.push_str(&escape_text(title));
    doc.push_str("</title>\n");

    if builder.stylesheet.is_some() {
        writeln!(
            doc,
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
            STYLESHEET_HREF
        )
        .unwrap();
    }

    doc.push_str("</head>\n<body>\n");
    doc.push_str(body);
    doc.push_str("\n</body>\n</html>\n");
    doc
}

fn generate_opf(builder: &EpubBuilder, identifier: &str) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_text(&builder.metadata.title)
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_text(identifier)
    ));

    let language = if builder.metadata.language.is_empty() {
        "en"
    } else {
        &builder.metadata.language
    };
    opf.push_str(&format!("    <dc:language>{}</dc:language>\n", language));

    if !builder.metadata.author.is_empty() {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_text(&builder.metadata.author)
        ));
    }

    if !builder.metadata.description.is_empty() {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_text(&builder.metadata.description)
        ));
    }

    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );

    if builder.stylesheet.is_some() {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"text/css\"/>\n",
            href_to_id(STYLESHEET_HREF),
            STYLESHEET_HREF
        ));
    }

    for section in &builder.sections {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            href_to_id(&section.href),
            escape_text(&section.href)
        ));
    }

    for image in &builder.images {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
            href_to_id(&image.href),
            escape_text(&image.href),
            escape_text(&image.media_type)
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");

    for section in &builder.sections {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            href_to_id(&section.href)
        ));
    }

    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_ncx(builder: &EpubBuilder, identifier: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );

    ncx.push_str(&escape_text(identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape_text(&builder.metadata.title));
    ncx.push_str(
        r#"</text>
  </docTitle>
  <navMap>
"#,
    );

    for (i, section) in builder.sections.iter().enumerate() {
        let play_order = i + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"navpoint-{}\" playOrder=\"{}\">\n",
            play_order, play_order
        ));
        ncx.push_str(&format!(
            "      <navLabel>\n        <text>{}</text>\n      </navLabel>\n",
            escape_text(&section.title)
        ));
        ncx.push_str(&format!(
            "      <content src=\"{}\"/>\n",
            escape_text(&section.href)
        ));
        ncx.push_str("    </navPoint>\n");
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn href_to_id(href: &str) -> String {
    href.replace(['/', '.', ' ', '-'], "_")
}

/// Generate a simple UUID v4 for the package identifier.
fn uuid_v4() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345);

    // Time-seeded PRNG; identifiers need uniqueness, not unpredictability.
    let mut state = seed;
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        *byte = (state >> 33) as u8;
    }

    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::EpubMetadata;
    use std::io::Cursor;

    fn sample_builder() -> EpubBuilder {
        let mut builder = EpubBuilder::new(EpubMetadata {
            title: "Sample".into(),
            author: "Author".into(),
            description: "About the sample".into(),
            language: "en".into(),
        });
        builder.add_stylesheet("body { margin: 0; }");
        builder.add_section("Title Page", "<p>title</p>");
        builder.add_section("Contents", "<p>toc</p>");
        builder.add_image(vec![1, 2, 3], "image/png");
        builder
    }

    #[test]
    fn test_opf_lists_manifest_and_spine_in_order() {
        let opf = generate_opf(&sample_builder(), "urn:uuid:test");
        assert!(opf.contains("<dc:title>Sample</dc:title>"));
        assert!(opf.contains("<dc:creator>Author</dc:creator>"));
        assert!(opf.contains("href=\"section0001.xhtml\""));
        assert!(opf.contains("href=\"images/image_0001.png\" media-type=\"image/png\""));
        let spine_pos = opf.find("<spine").unwrap();
        let first = opf[spine_pos..].find("section0001_xhtml").unwrap();
        let second = opf[spine_pos..].find("section0002_xhtml").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_ncx_navpoints_match_sections() {
        let ncx = generate_ncx(&sample_builder(), "urn:uuid:test");
        assert!(ncx.contains("<text>Title Page</text>"));
        assert!(ncx.contains("<content src=\"section0002.xhtml\"/>"));
        assert!(ncx.contains("playOrder=\"2\""));
    }

    #[test]
    fn test_section_document_links_stylesheet() {
        let builder = sample_builder();
        let doc = section_document(&builder, "One & Two", "<p>body</p>");
        assert!(doc.contains("<title>One &amp; Two</title>"));
        assert!(doc.contains("href=\"styles.css\""));
        assert!(doc.contains("<p>body</p>"));
    }

    #[test]
    fn test_archive_layout() {
        let mut buf = Cursor::new(Vec::new());
        sample_builder().write_to(&mut buf).unwrap();

        let mut archive = zip::ZipArchive::new(buf).unwrap();
        // mimetype must be the first entry, stored uncompressed.
        assert_eq!(archive.by_index(0).unwrap().name(), "mimetype");
        for name in [
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/toc.ncx",
            "OEBPS/styles.css",
            "OEBPS/section0001.xhtml",
            "OEBPS/section0002.xhtml",
            "OEBPS/images/image_0001.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
    }
}
