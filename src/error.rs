use compact_str::CompactString;
use thiserror::Error;

use crate::db::{BB8Error, DBError};

/// Per-item failures of the allocator, parser and retry selector.
///
/// None of these abort a batch: they are collected next to the partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("malformed case identifier {input:?}: {reason}")]
    MalformedIdentifier {
        input: CompactString,
        reason: &'static str,
    },

    #[error("county {county:?} has no configured code, using {fallback:?}")]
    Configuration {
        county: CompactString,
        fallback: &'static str,
    },

    #[error("partition ({county}, {year}) cannot extend past case number {max}")]
    NumberOverflow {
        county: CompactString,
        year: i32,
        max: i64,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(#[from] BB8Error),

    #[error("database: {0}")]
    Db(#[from] DBError),
}

/// Outcome of one retrieval that produced no page at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out")]
    Timeout,

    #[error("unavailable: {0}")]
    Unavailable(String),
}
