//! Ranking ingestion, cross-table reconciliation, and indexing pipeline.
//!
//! This crate implements every core component of the admission-rankings
//! archive: bounded-concurrency HTTP fetching (C1), persisted link
//! de-duplication (C2), news-feed discovery (C3), the recursive ranking
//! downloader (C4), the HTML writer (C5), the index-header and phase
//! parsers (C6/C7), the merit and course table parsers (C8/C9), the
//! roll-up indexer and id-hash index (C10/C11), and the pipeline driver
//! that orchestrates all of the above (C12).

pub mod bruteforce;
pub mod constants;
pub mod course_table;
pub mod download;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod html_writer;
pub mod id_hash_index;
pub mod index_header;
pub mod links;
pub mod manifesti;
pub mod merit_table;
pub mod migrate;
pub mod model;
pub mod phase;
pub mod pipeline;
pub mod rollup;
pub mod table;
pub mod writer;

pub use error::{IngestError, Result};
