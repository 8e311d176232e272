//! Error types for the bookmark store

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Neither `$HOME` nor the platform user database yielded a home
    /// directory, so the store has no location.
    #[error("Could not determine home directory for the bookmark store")]
    NoHomeDirectory,

    /// A single non-blocking lock attempt failed; another process holds a
    /// conflicting lock. Never retried.
    #[error("Bookmark store is locked by another process: {path}")]
    Locked { path: PathBuf },

    #[error("I/O error on bookmark store {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
