//! Thin safe wrapper over the kernel's inotify facility
//!
//! Owns the notification fd for the process lifetime; individual watches are
//! never removed, the kernel releases them when the fd closes on drop.

use std::ffi::{CString, OsStr};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;

pub use libc::{IN_CLOSE_WRITE, IN_DELETE, IN_DELETE_SELF, IN_IGNORED, IN_MOVED_FROM, IN_MOVED_TO};

/// Build the per-run event mask.
///
/// Creation and overwrite are always watched: a written file surfaces as
/// `IN_CLOSE_WRITE`, an atomic rename-replacement as `IN_MOVED_TO`. Removal
/// classes are only requested when deletion detection is on, so a run without
/// it never even receives deletion records.
pub fn watch_mask(detect_removals: bool) -> u32 {
    let mut mask = IN_CLOSE_WRITE | IN_MOVED_TO;
    if detect_removals {
        mask |= IN_DELETE | IN_DELETE_SELF | IN_MOVED_FROM;
    }
    mask
}

/// An inotify instance, closed on drop
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    /// Open the notification facility.
    ///
    /// Failure here is fatal to the whole program; nothing can be watched
    /// without the fd.
    pub fn init() -> io::Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// Begin watching `dir` for the event classes in `mask`.
    ///
    /// Returns the kernel's watch descriptor. Watching the same directory
    /// twice returns the same descriptor.
    pub fn add_watch(&self, dir: &OsStr, mask: u32) -> io::Result<i32> {
        let dir = CString::new(dir.as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;
        let wd = unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), dir.as_ptr(), mask) };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(wd)
    }

    /// Block until at least one event record is available and fill `buf`.
    ///
    /// Returns the number of bytes read. Zero or an error means the channel
    /// is broken; the caller treats both as fatal.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}
