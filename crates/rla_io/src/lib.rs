//! crates/rla_io/src/lib.rs
//! Text-facing I/O for the verifier.
//!
//! - `parser`: lenient sectioned-report parser (lines → `Report`).
//! - `writer`: the inverse, used to generate synthetic reports.
//! - `loader`: file reading + SHA-256 provenance, params JSON.
//! - `canonical_json`, `hasher`: deterministic output bytes and digests.
//!
//! Shared error type (`IoError`) with `From` conversions used across modules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for rla_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, read, rename, fsync, …).
    #[error("io/path error: {0}")]
    Path(String),

    /// Report bytes that are not valid UTF-8.
    #[error("report is not valid UTF-8: {0}")]
    Utf8(String),

    /// JSON serialization/deserialization errors with an optional JSON Pointer.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Hashing-related errors (e.g., feature disabled).
    #[error("hash error: {0}")]
    Hash(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column rather than a pointer; default to root.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub mod canonical_json;
pub mod csv_line;
#[cfg(feature = "hash")]
pub mod hasher;
pub mod loader;
pub mod parser;
pub mod report;
pub mod writer;

pub use parser::parse_lines;
pub use report::{Record, Report, SectionKind, Table};
pub use writer::write_report;

/// Compute SHA-256 hex of `bytes` or fail loudly when hashing is compiled out.
pub fn try_sha256_hex(bytes: &[u8]) -> Result<String, IoError> {
    #[cfg(feature = "hash")]
    {
        Ok(crate::hasher::sha256_hex(bytes))
    }
    #[cfg(not(feature = "hash"))]
    {
        let _ = bytes;
        Err(IoError::Hash("hash feature disabled".into()))
    }
}

pub mod prelude {
    pub use crate::{IoError, IoResult, try_sha256_hex};
    pub use crate::{parse_lines, write_report, Record, Report, SectionKind, Table};
    pub use crate::canonical_json::to_canonical_json_bytes;
}
