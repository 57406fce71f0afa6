//! Scratch socket directories and exact-length path construction.
//!
//! Unix socket paths are limited to 107 bytes, and the boundary tests
//! need paths of a precise byte length. [`path_with_len`] pads a file
//! name inside a base directory until the whole path hits the target.

use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A tempfile-backed directory for test sockets.
///
/// Deleted automatically on drop, guaranteeing cleanup even on panic.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create scratch dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A socket path inside the scratch dir with the given file name.
    pub fn socket(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a path under `base` whose total byte length is exactly
/// `target_len`.
///
/// # Panics
///
/// Panics when `base` is already too long to leave room for at least
/// one file-name byte.
pub fn path_with_len(base: &Path, target_len: usize) -> PathBuf {
    // +1 for the joining '/'
    let base_len = base.as_os_str().as_bytes().len() + 1;
    assert!(
        target_len > base_len,
        "base dir {base:?} leaves no room for a {target_len}-byte path"
    );
    let name = "x".repeat(target_len - base_len);
    let path = base.join(name);
    debug_assert_eq!(path.as_os_str().as_bytes().len(), target_len);
    path
}
