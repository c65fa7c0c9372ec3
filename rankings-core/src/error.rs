//! Error taxonomy for the ingestion pipeline (see the error handling design).
//!
//! Only a handful of conditions ever abort a whole run: an unreadable data
//! root, an unreadable manifesti list, or the inability to create output
//! directories. Everything else is logged and the affected unit of work
//! (one page, one ranking, one link) is skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Bad argv or a missing/unusable data directory.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connection, timeout, DNS, TLS).
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response came back with a non-200 status.
    #[error("unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Structural mismatch in HTML, an unrecognized phase shape, or an
    /// unrecognized school. Never fatal to a batch; the one ranking is
    /// skipped.
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing data where it was expected on record (e.g. a matricola id
    /// missing on a year where ids are always present). Warn-only.
    #[error("data quality issue: {0}")]
    DataQuality(String),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
