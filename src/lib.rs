//! Pagemark - per-document last-read-page bookmarks in a shared flat file
//!
//! A document viewer calls [`save_bookmark`] when closing a document and
//! [`read_bookmark`] when opening one. Bookmarks for every document live in
//! a single text file under the user's home directory, one
//! `docpath = pageno` record per line. Concurrent viewers coordinate through
//! whole-file advisory locks, and every write replaces the file atomically,
//! so a bookmark failure never corrupts the store and never aborts the
//! caller.
//!
//! The sentinel functions never fail: any error degrades to [`NO_BOOKMARK`]
//! (reads) or a silent no-op (writes), with a diagnostic on the `log`
//! facade. Embedders that want the actual errors use [`BookmarkStore`]
//! directly.

mod error;
mod line_reader;
mod paths;
mod record;
mod store;

pub use error::StoreError;
pub use line_reader::LineReader;
pub use paths::{resolve_store_path, STORE_FILE_NAME};
pub use store::BookmarkStore;

use log::warn;

/// Sentinel meaning "no bookmark". Returned by [`read_bookmark`] on absence
/// or any error; passing it to [`save_bookmark`] makes the call a no-op.
/// Never persisted.
pub const NO_BOOKMARK: i32 = -1;

/// Returns the saved page number for `docpath`, or [`NO_BOOKMARK`] if none
/// exists or anything went wrong.
///
/// An empty `docpath` is treated as absent input. Lock contention counts as
/// "no bookmark": a single non-blocking lock attempt is made and never
/// retried, so this call cannot stall on a busy store.
pub fn read_bookmark(docpath: &str) -> i32 {
    if docpath.is_empty() {
        return NO_BOOKMARK;
    }

    let store = match BookmarkStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            warn!("cannot locate bookmark store: {e}");
            return NO_BOOKMARK;
        }
    };

    match store.lookup(docpath) {
        Ok(Some(pageno)) => pageno,
        Ok(None) => NO_BOOKMARK,
        Err(e) => {
            warn!("failed to read bookmark for {docpath}: {e:#}");
            NO_BOOKMARK
        }
    }
}

/// Persists `pageno` as the bookmark for `docpath`.
///
/// A no-op when `docpath` is empty or `pageno` is [`NO_BOOKMARK`]; that is
/// how "nothing to save" is signaled, there is no delete operation. Failures
/// abandon the save and leave the previous store state intact; they are
/// logged, never surfaced.
pub fn save_bookmark(docpath: &str, pageno: i32) {
    if docpath.is_empty() || pageno == NO_BOOKMARK {
        return;
    }

    let store = match BookmarkStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            warn!("cannot locate bookmark store: {e}");
            return;
        }
    };

    if let Err(e) = store.save(docpath, pageno) {
        warn!("failed to save bookmark for {docpath}: {e:#}");
    }
}
