//! Error types for untable library.

use std::io;
use thiserror::Error;

/// Result type alias for untable operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while locating tables.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a PDF document.
    #[error("Unsupported format: not a valid PDF")]
    UnsupportedFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and no password was given.
    #[error("Document is encrypted")]
    Encrypted,

    /// The provided password is incorrect.
    #[error("Invalid password")]
    InvalidPassword,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A page carries no text lines to build a style index from.
    #[error("Zero discriminating fonts found on page {page}")]
    NoDiscriminatingFonts {
        /// Page number (1-indexed)
        page: u32,
    },

    /// Rasterizing a page failed.
    #[error("Failed to render page {page}: {message}")]
    Render {
        /// Page number (1-indexed)
        page: u32,
        /// Renderer message
        message: String,
    },

    /// Error encoding or decoding a raster image.
    #[error("Image error: {0}")]
    Image(String),

    /// The region detector failed.
    #[error("Detection error: {0}")]
    Detection(String),

    /// The cell extractor failed.
    #[error("Cell extraction error: {0}")]
    CellExtraction(String),

    /// Error serializing a report.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::Image(err.to_string()),
        }
    }
}
