//! Directory-path computation for watch targeting
//!
//! `parent_dir` reimplements `dirname(3)` semantics on raw bytes: drop
//! trailing separators, then drop the last component. It deliberately does not
//! go through `std::path::Path::parent`, which normalizes components and would
//! not preserve the exact strings the interest set matches on.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

/// Placeholder for the working directory, as produced by [`parent_dir`] for
/// paths without a separator.
pub const CURRENT_DIR: &str = ".";

/// Compute the directory portion of `path`, `dirname(3)`-style.
///
/// Trailing separators are stripped, then the last component is dropped. A
/// path with no separator yields `"."`; a path consisting only of separators
/// yields `"/"`; the empty path yields `"."`.
pub fn parent_dir(path: &OsStr) -> OsString {
    let bytes = path.as_bytes();

    // Strip trailing separators.
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b'/' {
        end -= 1;
    }
    if end == 0 {
        // Empty, or nothing but separators.
        return if bytes.is_empty() {
            OsString::from(CURRENT_DIR)
        } else {
            OsString::from("/")
        };
    }

    // Drop the last component.
    match bytes[..end].iter().rposition(|&b| b == b'/') {
        None => OsString::from(CURRENT_DIR),
        Some(mut sep) => {
            // Collapse separator runs so "a//b" yields "a", not "a/".
            while sep > 0 && bytes[sep - 1] == b'/' {
                sep -= 1;
            }
            if sep == 0 {
                OsString::from("/")
            } else {
                OsString::from_vec(bytes[..sep].to_vec())
            }
        }
    }
}

/// Determine the directory that must be watched for `path`.
///
/// An existing directory is watched directly; anything else — a regular file,
/// a symlink (not followed), or a path that does not exist yet — watches its
/// parent, because inotify cannot watch a missing file and atomic
/// rename-replacement is only visible on the containing directory.
pub fn watch_target(path: &OsStr) -> OsString {
    match fs::symlink_metadata(Path::new(path)) {
        Ok(meta) if meta.is_dir() => path.to_os_string(),
        _ => parent_dir(path),
    }
}
