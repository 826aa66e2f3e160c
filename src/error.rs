//! Error types for eds-json operations.

use thiserror::Error;

/// Errors that can occur while loading schemas or extracting a page.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid schema {location}: {message}")]
    InvalidSchema { location: String, message: String },

    #[error("Schema loading failed: {0}")]
    SchemaTransport(String),

    #[error("Failed to fetch page {url}: status {status}")]
    PageFetch { url: String, status: u16 },

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown transformer: {0}")]
    UnknownTransformer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
