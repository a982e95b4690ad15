//! Error types for bindery operations.

use thiserror::Error;

/// Errors that can occur while assembling an output artifact.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("no chapters provided for conversion")]
    NoChapters,

    #[error("could not find table of contents element")]
    TocNotFound,

    #[error("chapter {title:?}: {source}")]
    Chapter {
        title: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the offending chapter's title to an error from a pipeline stage.
    pub fn for_chapter(title: impl Into<String>, source: Error) -> Error {
        Error::Chapter {
            title: title.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
