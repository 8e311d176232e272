//! Store location resolution
//!
//! The store lives directly under the user's home directory as
//! `.pagemark_bookmarks`. `$HOME` wins when set; otherwise the platform
//! user database decides (passwd entry on POSIX, profile variables on
//! Windows, both via the `directories` crate). Resolution is cheap and
//! re-runs on every call; nothing is cached.

use std::env;
use std::path::PathBuf;

use directories::UserDirs;

use crate::error::StoreError;

/// Fixed filename of the store inside the home directory.
pub const STORE_FILE_NAME: &str = ".pagemark_bookmarks";

/// Computes the absolute path of the bookmark store file.
pub fn resolve_store_path() -> Result<PathBuf, StoreError> {
    home_dir()
        .map(|home| home.join(STORE_FILE_NAME))
        .ok_or(StoreError::NoHomeDirectory)
}

fn home_dir() -> Option<PathBuf> {
    if let Some(home) = env::var_os("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
