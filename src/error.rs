//! Error type for loading the files the pipeline reads.
//!
//! Per-character processing never fails; only I/O and (de)serialization of the
//! cache, reference, patch, override and config files can.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON file {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse YAML {path:?}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A cache line had a character key but no markup column.
    #[error("malformed cache line {line}: expected `char<TAB>markup[<TAB>...]`")]
    MalformedCacheLine { line: usize },

    #[error("could not find {0}; pass the path explicitly")]
    ConfigNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
