//! Image inlining for EPUB output.
//!
//! Every `img` source is turned into an archive-local resource: sources
//! that are already `data:` URLs are decoded and re-keyed into the ledger
//! without touching the network, remote sources go through the caller's
//! [`ImageFetcher`]. Failures degrade: the element keeps its original
//! source and the conversion carries on.

use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, warn};
use markup5ever_rcdom::Handle;
use percent_encoding::percent_decode_str;

use crate::dom::{find_all_nodes, get_attr, is_element, set_attr};
use crate::epub::EpubBuilder;

/// Raw bytes and transport metadata for one fetched image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Vec<u8>,
    /// Transport-reported media type, if the transport provided one.
    pub media_type: Option<String>,
}

/// Collaborator that retrieves remote image bytes.
///
/// The pipeline itself never opens a connection; implementors own transport
/// concerns like timeouts and redirects. Fetches block the conversion until
/// they return.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> io::Result<FetchedImage>;
}

/// Resolve every `img` source in a subtree to an archive-local resource.
///
/// A source that cannot be decoded or fetched is left untouched; the
/// element is skipped and conversion continues.
pub fn inline_images(root: &Handle, builder: &mut EpubBuilder, fetcher: &dyn ImageFetcher) {
    for img in find_all_nodes(root, &|n| is_element(n, "img")) {
        let Some(src) = get_attr(&img, "src") else {
            continue;
        };
        if src.is_empty() {
            continue;
        }

        if src.starts_with("data:") {
            match parse_data_url(&src) {
                Some((media_type, data)) => {
                    let href = builder.add_image(data, &media_type);
                    set_attr(&img, "src", &href);
                }
                None => debug!("skipping undecodable data URL"),
            }
            continue;
        }

        match fetcher.fetch(&src) {
            Ok(fetched) => {
                let media_type = fetched
                    .media_type
                    .filter(|m| !m.is_empty())
                    .or_else(|| media_type_for_url(&src).map(str::to_string));
                match media_type {
                    Some(media_type) => {
                        let href = builder.add_image(fetched.data, &media_type);
                        set_attr(&img, "src", &href);
                    }
                    None => debug!("skipping image with unknown media type: {src}"),
                }
            }
            Err(err) => warn!("image fetch failed for {src}: {err}"),
        }
    }
}

/// Decode a `data:` URL into its media type and payload bytes.
fn parse_data_url(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    let is_base64 = header.ends_with(";base64");
    let media_type = match header.split(';').next() {
        Some("") | None => "text/plain",
        Some(media_type) => media_type,
    };

    let data = if is_base64 {
        BASE64.decode(payload.as_bytes()).ok()?
    } else {
        percent_decode_str(payload).collect()
    };

    Some((media_type.to_string(), data))
}

/// Infer a media type from the address's file extension.
pub(crate) fn media_type_for_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
