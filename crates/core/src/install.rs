//! Watch installation
//!
//! Feeds user-supplied paths into the interest set and the directory watch
//! registry. Interests are recorded before the kernel is asked, so a path
//! whose watch cannot be installed still matches later events if its
//! directory becomes observable through another entry.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::inotify::Inotify;
use crate::interest::InterestSet;
use crate::path::watch_target;
use crate::registry::WatchRegistry;

/// A directory could not be watched. Non-fatal: the caller reports it and
/// keeps installing the remaining targets.
#[derive(Debug, Error)]
#[error("inotify_add_watch: {}: {source}", .dir.display())]
pub struct WatchError {
    /// The directory the watch was attempted on
    pub dir: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Converts interest paths into directory watches
pub struct Installer<'fd> {
    inotify: &'fd Inotify,
    mask: u32,
    interests: InterestSet,
    registry: WatchRegistry,
}

impl<'fd> Installer<'fd> {
    /// Create an installer registering watches with the given event mask
    pub fn new(inotify: &'fd Inotify, mask: u32) -> Self {
        Self {
            inotify,
            mask,
            interests: InterestSet::new(),
            registry: WatchRegistry::new(),
        }
    }

    /// Record interest in `path` and ensure its directory is watched.
    ///
    /// The directory is the path itself if it is an existing directory,
    /// otherwise its parent. Already-watched directories are not re-registered
    /// with the kernel. An `Err` leaves the interest in place and the
    /// directory unwatched.
    pub fn install(&mut self, path: &OsStr) -> Result<(), WatchError> {
        self.interests.register(path);

        let dir = watch_target(path);
        if self.registry.contains(&dir) {
            return Ok(());
        }

        match self.inotify.add_watch(&dir, self.mask) {
            Ok(wd) => {
                debug!(dir = %Path::new(&dir).display(), wd, "registered directory watch");
                self.registry.insert(dir, wd);
                Ok(())
            }
            Err(source) => Err(WatchError {
                dir: PathBuf::from(dir),
                source,
            }),
        }
    }

    /// Number of interests registered so far
    pub fn interest_count(&self) -> usize {
        self.interests.len()
    }

    /// Number of directory watches installed so far
    pub fn watch_count(&self) -> usize {
        self.registry.len()
    }

    /// Hand the populated lookup structures to the watch loop
    pub fn into_parts(self) -> (InterestSet, WatchRegistry) {
        (self.interests, self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inotify::watch_mask;
    use tempfile::TempDir;

    #[test]
    fn test_shared_parent_creates_one_watch() {
        let tmp = TempDir::new().unwrap();
        let fd = Inotify::init().unwrap();
        let mut installer = Installer::new(&fd, watch_mask(false));

        for name in ["a.txt", "b.txt", "c.txt"] {
            installer.install(tmp.path().join(name).as_os_str()).unwrap();
        }

        assert_eq!(installer.interest_count(), 3);
        assert_eq!(installer.watch_count(), 1);
    }

    #[test]
    fn test_duplicate_install_is_noop() {
        let tmp = TempDir::new().unwrap();
        let fd = Inotify::init().unwrap();
        let mut installer = Installer::new(&fd, watch_mask(false));

        let path = tmp.path().join("f.txt");
        installer.install(path.as_os_str()).unwrap();
        installer.install(path.as_os_str()).unwrap();

        assert_eq!(installer.interest_count(), 1);
        assert_eq!(installer.watch_count(), 1);
    }

    #[test]
    fn test_existing_directory_watched_directly() {
        let tmp = TempDir::new().unwrap();
        let fd = Inotify::init().unwrap();
        let mut installer = Installer::new(&fd, watch_mask(false));

        installer.install(tmp.path().as_os_str()).unwrap();

        let (_, registry) = installer.into_parts();
        assert!(registry.contains(tmp.path().as_os_str()));
    }

    #[test]
    fn test_missing_parent_fails_without_losing_interest() {
        let tmp = TempDir::new().unwrap();
        let fd = Inotify::init().unwrap();
        let mut installer = Installer::new(&fd, watch_mask(false));

        // a/ does not exist: the watch attempt targets a, not the cwd.
        let orphan = tmp.path().join("a").join("b.txt");
        let err = installer.install(orphan.as_os_str()).unwrap_err();
        assert_eq!(err.dir, tmp.path().join("a"));
        assert_eq!(installer.interest_count(), 1);
        assert_eq!(installer.watch_count(), 0);

        // A later, valid target still installs fine.
        installer.install(tmp.path().join("ok.txt").as_os_str()).unwrap();
        assert_eq!(installer.watch_count(), 1);
    }
}
