//! Event resolution and the blocking watch loop
//!
//! Turns decoded records back into user-facing paths: the record's watch
//! descriptor names a directory, the record's name field a file inside it.
//! A reconstructed path is reported when it is an interest itself or when the
//! whole directory is.

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use anyhow::{bail, Context};
use tracing::trace;

use crate::inotify::{Inotify, IN_DELETE, IN_IGNORED, IN_MOVED_FROM};
use crate::interest::InterestSet;
use crate::path::CURRENT_DIR;
use crate::record::{RawRecord, Records};
use crate::registry::WatchRegistry;

/// Size of the kernel read buffer; large enough for a burst of records
const READ_BUF_LEN: usize = 8192;

/// Whether a path appeared (created, written, moved in) or was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Appeared,
    Removed,
}

/// One reportable change, reconstructed from a raw record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    /// Full path: watched directory + name, or the bare name under "."
    pub path: OsString,
    pub kind: EventKind,
}

/// Resolve one raw record against the registry and interest set.
///
/// Returns `None` for everything that must be skipped silently: kernel
/// watch-removal bookkeeping (`IN_IGNORED`), records from unknown watch
/// descriptors (stale, foreign, queue overflow), and paths nobody asked
/// about.
pub fn resolve(
    record: &RawRecord<'_>,
    registry: &WatchRegistry,
    interests: &InterestSet,
) -> Option<ResolvedEvent> {
    if record.mask & IN_IGNORED != 0 {
        return None;
    }

    let dir = registry.resolve(record.wd)?;
    let path = reconstruct(dir, record.name);

    if !interests.contains(&path) && !interests.contains(dir) {
        return None;
    }

    // Directory self-deletion (IN_DELETE_SELF) carries no name and is
    // reported as a bare appearance of the directory path.
    let kind = if record.mask & (IN_DELETE | IN_MOVED_FROM) != 0 {
        EventKind::Removed
    } else {
        EventKind::Appeared
    };

    Some(ResolvedEvent { path, kind })
}

/// Rebuild the full path a record refers to.
///
/// Under the working-directory placeholder the name stands alone, with no
/// leading separator; everywhere else it is `dir/name`.
fn reconstruct(dir: &OsStr, name: &OsStr) -> OsString {
    if dir == OsStr::new(CURRENT_DIR) {
        return name.to_os_string();
    }
    let mut full = Vec::with_capacity(dir.len() + 1 + name.len());
    full.extend_from_slice(dir.as_bytes());
    full.push(b'/');
    full.extend_from_slice(name.as_bytes());
    OsString::from_vec(full)
}

/// Writes report records to the output sink
pub struct Reporter<W: Write> {
    out: W,
    delimiter: u8,
}

impl<W: Write> Reporter<W> {
    /// Report onto `out`, one record per event, ending in `delimiter`
    pub fn new(out: W, delimiter: u8) -> Self {
        Self { out, delimiter }
    }

    /// Emit one report record and flush it.
    ///
    /// The consumer on the other end may be blocked waiting for exactly this
    /// record, so every report is flushed as soon as it is written.
    pub fn emit(&mut self, event: &ResolvedEvent) -> io::Result<()> {
        if event.kind == EventKind::Removed {
            self.out.write_all(b"- ")?;
        }
        self.out.write_all(event.path.as_bytes())?;
        self.out.write_all(&[self.delimiter])?;
        self.out.flush()
    }
}

/// Block on the notification channel and report qualifying events until
/// terminated.
///
/// `suppress` is consulted before each emission; returning `true` drops that
/// one report (pipe backpressure) and the loop continues with the next
/// record. With `single_shot` the function returns `Ok(())` right after the
/// first emitted report. Every other return is an error: a failed or
/// zero-length channel read, a corrupt record, or a failed write to the sink.
pub fn run<W: Write>(
    inotify: &Inotify,
    registry: &WatchRegistry,
    interests: &InterestSet,
    reporter: &mut Reporter<W>,
    single_shot: bool,
    mut suppress: impl FnMut() -> bool,
) -> crate::Result<()> {
    let mut buf = [0u8; READ_BUF_LEN];

    loop {
        let filled = inotify
            .read(&mut buf)
            .context("error reading inotify buffer")?;
        if filled == 0 {
            bail!("error reading inotify buffer: unexpected end of stream");
        }
        trace!(bytes = filled, "read event buffer");

        for record in Records::new(&buf[..filled]) {
            let record = record.context("corrupt inotify record")?;

            let Some(event) = resolve(&record, registry, interests) else {
                continue;
            };

            if suppress() {
                continue;
            }

            reporter.emit(&event).context("error writing report")?;

            if single_shot {
                return Ok(());
            }
        }
    }
}
