//! Pipe backpressure probe
//!
//! The one place the program observes a resource it does not own: the unread
//! byte count of the consumer's end of stdout. Strictly advisory — it only
//! decides whether a report is emitted, never how the kernel channel is read.

/// Whether stdout still has unread bytes queued downstream.
///
/// Returns false when the count cannot be determined (stdout is not a pipe,
/// or the ioctl is unsupported); suppression is best-effort.
pub fn stdout_backlogged() -> bool {
    let mut pending: libc::c_int = 0;
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::FIONREAD as _, &mut pending) };
    rc == 0 && pending > 0
}
