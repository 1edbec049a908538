//! Watch-registration and event-resolution engine for pathwake
//!
//! This crate turns a flat list of user-supplied paths into a minimal set of
//! directory-level inotify watches, decodes the raw event stream, and matches
//! each event back to the original interest set:
//! - Interest set and directory watch registry (exact-byte path lookup)
//! - Watch installer (parent-directory targeting, non-fatal failures)
//! - Raw record decoder (validating cursor over the read buffer)
//! - Resolver and blocking watch loop (report emission, single-shot,
//!   backpressure suppression)
//!
//! Everything is single-threaded and Linux-only; the `cli` crate owns flag
//! parsing, stdin ingestion, and exit codes.

pub mod inotify;
pub mod install;
pub mod interest;
pub mod path;
pub mod record;
pub mod registry;
pub mod resolve;

// Re-exports
pub use inotify::{watch_mask, Inotify};
pub use install::{Installer, WatchError};
pub use interest::InterestSet;
pub use path::{parent_dir, watch_target, CURRENT_DIR};
pub use record::{DecodeError, RawRecord, Records};
pub use registry::WatchRegistry;
pub use resolve::{resolve, run, EventKind, Reporter, ResolvedEvent};

/// Result type for watch-loop operations
pub type Result<T> = anyhow::Result<T>;
