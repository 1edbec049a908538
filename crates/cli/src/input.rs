//! Delimiter-split path ingestion
//!
//! Feeds stdin tokens into the watch installer. Pure plumbing: split on the
//! configured delimiter, strip it, pass the raw bytes through untouched.

use std::ffi::OsStr;
use std::io::{self, BufRead};
use std::os::unix::ffi::OsStrExt;

/// Invoke `f` for every delimiter-separated token of `reader`.
///
/// The trailing delimiter is stripped from each token; a final token without
/// one is still delivered. Empty tokens pass through as empty paths.
pub fn each_path<R, F>(reader: &mut R, delimiter: u8, mut f: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&OsStr),
{
    let mut token = Vec::new();
    loop {
        token.clear();
        let read = reader.read_until(delimiter, &mut token)?;
        if read == 0 {
            return Ok(());
        }
        if token.last() == Some(&delimiter) {
            token.pop();
        }
        f(OsStr::from_bytes(&token));
    }
}
