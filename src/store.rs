//! Flat-file bookmark store
//!
//! All bookmarks live in one text file, one record per line (see
//! [`crate::record`]). Concurrent access across processes is coordinated
//! with whole-file advisory locks (`fs2`): a shared lock for the read scan,
//! a single exclusive lock held across the write path's entire
//! read-rewrite-replace sequence. The live file is never edited in place;
//! writers build a complete replacement in a uniquely named temp file and
//! rename it over the store, so readers observe either the old contents or
//! the new, never a mixture.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::line_reader::LineReader;
use crate::paths;
use crate::record;

/// Store for last-read-page bookmarks keyed by document path.
pub struct BookmarkStore {
    path: PathBuf,
}

impl BookmarkStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the store at its default location under the home directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(paths::resolve_store_path()?))
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the saved page number for `docpath`.
    ///
    /// Returns `Ok(None)` when the store does not exist, no record matches,
    /// or the first matching record does not hold a valid page number. The
    /// scan stops at the first match; externally introduced duplicates are
    /// never consulted.
    pub fn lookup(&self, docpath: &str) -> Result<Option<i32>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open bookmark store: {}", self.path.display())
                })
            }
        };

        // Single non-blocking attempt. Scanning without the lock could
        // observe a writer's replacement mid-flight.
        try_lock_shared(&file, &self.path)?;

        for line in LineReader::new(BufReader::new(&file)) {
            let line = line.with_context(|| {
                format!("Failed to read bookmark store: {}", self.path.display())
            })?;

            if let Some(value) = record::match_record(&line, docpath) {
                // First match wins even when its value is invalid.
                return Ok(record::parse_pageno(value));
            }
        }

        // Lock is released when the handle drops.
        Ok(None)
    }

    /// Saves `pageno` as the bookmark for `docpath`, creating the store file
    /// on first use.
    ///
    /// An existing record is rewritten in place at its original position;
    /// a new key is appended. Externally introduced duplicate lines beyond
    /// the first match are copied through unchanged. On any failure the live
    /// store is left exactly as it was.
    pub fn save(&self, docpath: &str, pageno: i32) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| {
                format!("Failed to open bookmark store: {}", self.path.display())
            })?;

        // One exclusive lock across read, rewrite and replace. Two writers
        // must not both rewrite from the same before-state.
        try_lock_exclusive(&file, &self.path)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| {
            format!("Failed to create temp file in {}", dir.display())
        })?;

        let mut replaced = false;
        let mut terminated = true;
        for line in LineReader::new(BufReader::new(&file)) {
            let line = line.with_context(|| {
                format!("Failed to read bookmark store: {}", self.path.display())
            })?;

            if !replaced && record::match_record(&line, docpath).is_some() {
                tmp.write_all(record::format_record(docpath, pageno).as_bytes())
                    .context("Failed to write bookmark record")?;
                replaced = true;
                terminated = true;
            } else {
                tmp.write_all(line.as_bytes())
                    .context("Failed to copy bookmark record")?;
                terminated = line.ends_with('\n');
            }
        }

        if !replaced {
            // A final unterminated line must not swallow the new record.
            if !terminated {
                tmp.write_all(b"\n").context("Failed to write bookmark record")?;
            }
            tmp.write_all(record::format_record(docpath, pageno).as_bytes())
                .context("Failed to write bookmark record")?;
        }

        tmp.flush().context("Failed to flush bookmark store")?;

        // Atomic rename; a failure leaves the original store untouched and
        // the temp file is deleted on drop.
        tmp.persist(&self.path).map_err(|e| e.error).with_context(|| {
            format!("Failed to replace bookmark store: {}", self.path.display())
        })?;

        // `file` drops here, releasing the exclusive lock.
        Ok(())
    }
}

fn try_lock_shared(file: &File, path: &Path) -> Result<(), StoreError> {
    // UFCS: `File` grew inherent locking methods in newer std versions, and
    // those must not shadow the fs2 trait here.
    fs2::FileExt::try_lock_shared(file).map_err(|e| lock_error(e, path))
}

fn try_lock_exclusive(file: &File, path: &Path) -> Result<(), StoreError> {
    fs2::FileExt::try_lock_exclusive(file).map_err(|e| lock_error(e, path))
}

fn lock_error(source: io::Error, path: &Path) -> StoreError {
    if source.kind() == fs2::lock_contended_error().kind() {
        StoreError::Locked {
            path: path.to_path_buf(),
        }
    } else {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_store(dir: &TempDir) -> BookmarkStore {
        BookmarkStore::new(dir.path().join("bookmarks"))
    }

    #[test]
    fn lookup_on_missing_store() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn save_then_lookup() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        store.save("/docs/a.pdf", 5).unwrap();
        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(5));
        assert_eq!(store.lookup("/docs/b.pdf").unwrap(), None);
    }

    #[test]
    fn update_rewrites_in_place() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        store.save("/docs/a.pdf", 5).unwrap();
        store.save("/docs/b.pdf", 12).unwrap();
        store.save("/docs/a.pdf", 7).unwrap();

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(7));
        assert_eq!(store.lookup("/docs/b.pdf").unwrap(), Some(12));
        assert_eq!(store.lookup("/docs/c.pdf").unwrap(), None);

        // Updated record keeps its original position, no duplicates.
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "/docs/a.pdf = 7\n/docs/b.pdf = 12\n");
    }

    #[test]
    fn repeated_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        store.save("/docs/a.pdf", 5).unwrap();
        store.save("/docs/a.pdf", 5).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "/docs/a.pdf = 5\n");
    }

    #[test]
    fn saving_one_key_leaves_others_alone() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        store.save("/docs/a.pdf", 5).unwrap();
        store.save("/docs/b.pdf", 12).unwrap();

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(5));
    }

    #[test]
    fn invalid_stored_values_read_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        fs::write(
            store.path(),
            "/docs/a.pdf = junk\n/docs/b.pdf = 0\n/docs/c.pdf = -4\n/docs/d.pdf = 2147483648\n",
        )
        .unwrap();

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), None);
        assert_eq!(store.lookup("/docs/b.pdf").unwrap(), None);
        assert_eq!(store.lookup("/docs/c.pdf").unwrap(), None);
        assert_eq!(store.lookup("/docs/d.pdf").unwrap(), None);
    }

    #[test]
    fn first_duplicate_wins_and_rest_pass_through() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        // Duplicates only appear through external corruption; they are not
        // canonicalized.
        fs::write(store.path(), "/docs/a.pdf = 3\n/docs/a.pdf = 9\n").unwrap();

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(3));

        store.save("/docs/a.pdf", 4).unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "/docs/a.pdf = 4\n/docs/a.pdf = 9\n");
    }

    #[test]
    fn foreign_lines_are_copied_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        fs::write(store.path(), "not a record\n\n/docs/a.pdf = 2\n").unwrap();

        store.save("/docs/b.pdf", 6).unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "not a record\n\n/docs/a.pdf = 2\n/docs/b.pdf = 6\n");
    }

    #[test]
    fn append_after_unterminated_final_line() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        fs::write(store.path(), "/docs/a.pdf = 1").unwrap();

        store.save("/docs/b.pdf", 2).unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "/docs/a.pdf = 1\n/docs/b.pdf = 2\n");
        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(1));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);

        store.save("/docs/a.pdf", 5).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn lookup_fails_softly_when_exclusively_locked() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);
        store.save("/docs/a.pdf", 5).unwrap();

        let holder = File::open(store.path()).unwrap();
        fs2::FileExt::lock_exclusive(&holder).unwrap();

        let err = store.lookup("/docs/a.pdf").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Locked { .. })
        ));

        fs2::FileExt::unlock(&holder).unwrap();
        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(5));
    }

    #[test]
    fn save_fails_softly_when_shared_locked() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);
        store.save("/docs/a.pdf", 5).unwrap();

        let holder = File::open(store.path()).unwrap();
        fs2::FileExt::lock_shared(&holder).unwrap();

        let err = store.save("/docs/a.pdf", 9).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Locked { .. })
        ));

        fs2::FileExt::unlock(&holder).unwrap();

        // The failed save changed nothing.
        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(5));
    }

    #[test]
    fn concurrent_readers_are_allowed() {
        let dir = TempDir::new().unwrap();
        let store = make_store(&dir);
        store.save("/docs/a.pdf", 5).unwrap();

        let holder = File::open(store.path()).unwrap();
        fs2::FileExt::lock_shared(&holder).unwrap();

        assert_eq!(store.lookup("/docs/a.pdf").unwrap(), Some(5));

        fs2::FileExt::unlock(&holder).unwrap();
    }
}
