//! Structured error types for the indexing core, distinguishing the
//! propagation policies of spec §7: transient I/O, grammar absence, parse
//! errors, and Store invariant violations each get their own variant so
//! call sites can match on category instead of parsing messages.

use crate::types::{FileId, SymbolId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the Store (spec §4.1/§8).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("index path '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("index at '{path}' appears to be corrupted: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("duplicate key inserted: {reason}")]
    DuplicateKey { reason: String },

    #[error("edge references a missing endpoint: {reason}")]
    MissingEndpoint { reason: String },

    #[error("symbol {id:?} not found")]
    SymbolNotFound { id: SymbolId },

    #[error("file {id:?} not found")]
    FileNotFound { id: FileId },

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("io error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum RoamError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no grammar registered for '{path}' (extension '{extension}')")]
    UnsupportedLanguage { path: PathBuf, extension: String },

    #[error("failed to parse {language} file '{path}': {reason}")]
    Parse {
        path: PathBuf,
        language: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not acquire index lock: {reason}")]
    Lock { reason: String },

    #[error("invariant violated, aborting run without committing: {reason}")]
    Invariant { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

pub type Result<T> = std::result::Result<T, RoamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_roam_error() {
        let store_err = StoreError::DuplicateKey {
            reason: "qualified_name collision".into(),
        };
        let roam_err: RoamError = store_err.into();
        assert!(matches!(roam_err, RoamError::Store(_)));
    }
}
