//! Raw event record decoding
//!
//! A filled read buffer holds zero or more back-to-back variable-length
//! records: a fixed 16-byte header (watch descriptor, event mask, rename
//! cookie, name length) followed by `name length` bytes of NUL-padded
//! filename. Records are not uniformly sized — the cursor advances by the
//! declared length of each record, never by a fixed stride.
//!
//! The kernel is the only producer of these buffers, but a declared length
//! that does not fit the remaining buffer is still treated as a hard decode
//! error rather than trusted blindly.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use thiserror::Error;

/// Fixed size of the record header: wd (i32), mask (u32), cookie (u32),
/// name length (u32), all in native byte order.
pub const HEADER_LEN: usize = 16;

/// A malformed record buffer. Always fatal; the stream cannot be re-synced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated event header: {remaining} of {HEADER_LEN} bytes present")]
    TruncatedHeader { remaining: usize },
    #[error("declared name length {declared} overruns buffer ({remaining} bytes remain)")]
    NameOverrun { declared: usize, remaining: usize },
}

/// One decoded event record, borrowing its name from the read buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Originating watch descriptor; -1 for queue-overflow records
    pub wd: i32,
    /// Bitmask of fired event classes
    pub mask: u32,
    /// Correlates the two halves of a rename pair; unused here
    pub cookie: u32,
    /// Filename relative to the watched directory, NUL padding stripped.
    /// Empty for events about the watched directory itself.
    pub name: &'a OsStr,
}

/// Cursor over the records in one filled read buffer.
///
/// Yields each record in order; a decode error ends iteration.
#[derive(Debug)]
pub struct Records<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    /// Decode the `filled` leading bytes of a read buffer
    pub fn new(filled: &'a [u8]) -> Self {
        Self { buf: filled, pos: 0 }
    }
}

fn u32_ne(bytes: &[u8]) -> u32 {
    u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<RawRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];

        if rest.len() < HEADER_LEN {
            self.pos = self.buf.len();
            return Some(Err(DecodeError::TruncatedHeader {
                remaining: rest.len(),
            }));
        }

        let wd = u32_ne(&rest[0..4]) as i32;
        let mask = u32_ne(&rest[4..8]);
        let cookie = u32_ne(&rest[8..12]);
        let name_len = u32_ne(&rest[12..16]) as usize;

        if name_len > rest.len() - HEADER_LEN {
            self.pos = self.buf.len();
            return Some(Err(DecodeError::NameOverrun {
                declared: name_len,
                remaining: rest.len() - HEADER_LEN,
            }));
        }

        // The name is NUL-terminated inside the declared length, the rest of
        // which is alignment padding.
        let padded = &rest[HEADER_LEN..HEADER_LEN + name_len];
        let name = match padded.iter().position(|&b| b == 0) {
            Some(end) => &padded[..end],
            None => padded,
        };

        self.pos += HEADER_LEN + name_len;
        Some(Ok(RawRecord {
            wd,
            mask,
            cookie,
            name: OsStr::from_bytes(name),
        }))
    }
}
