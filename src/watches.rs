use std::{
    collections::HashMap,
    io,
    os::raw::c_int,
    path::{
        Path,
        PathBuf,
    },
};

use tracing::debug;
use walkdir::WalkDir;

use crate::channel::Channel;
use crate::config::Config;
use crate::error::{
    Error,
    Result,
};
use crate::mask::Mask;


/// Represents a watch on an inode
///
/// Returned by [`Inotify::add_watch`] and carried by every [`Event`]. The
/// kernel may hand the same number out again once the watch is removed.
///
/// [`Inotify::add_watch`]: crate::Inotify::add_watch
/// [`Event`]: crate::Event
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WatchDescriptor(pub(crate) c_int);

impl WatchDescriptor {
    /// The raw descriptor the kernel assigned
    pub fn id(&self) -> c_int {
        self.0
    }
}


/// Bookkeeping for the watches of one inotify instance
///
/// Keeps a bijection between watched paths and their descriptors: every
/// registered path has exactly one descriptor and every descriptor exactly one
/// path. Each method moves the mapping from one consistent state to the next.
#[derive(Debug)]
pub(crate) struct Watches {
    paths: HashMap<PathBuf, WatchDescriptor>,
    descriptors: HashMap<WatchDescriptor, PathBuf>,
    recursive: bool,
    config: Config,
}

impl Watches {
    pub(crate) fn new(config: Config) -> Self {
        Watches {
            paths: HashMap::new(),
            descriptors: HashMap::new(),
            recursive: false,
            config,
        }
    }

    /// Adds a watch for `path`, and for every directory below it if
    /// `recursive` is set
    ///
    /// `mask` defaults to the configured default mask. Recursive watches
    /// additionally get [`Mask::RECURSIVE`]. Fails with
    /// [`Error::DuplicatePath`] if any of the paths is already registered, in
    /// which case nothing is added. If the kernel refuses one of the watches
    /// of a recursive add, the ones added so far are taken down again before
    /// the error is returned.
    pub(crate) fn add(
        &mut self,
        channel: &Channel,
        path: &Path,
        mask: Option<Mask>,
        recursive: bool,
    ) -> Result<WatchDescriptor> {
        if self.paths.contains_key(path) {
            return Err(Error::DuplicatePath(path.to_path_buf()));
        }

        let mask = mask.unwrap_or(self.config.default_mask);

        if !recursive {
            return self.insert(channel, path.to_path_buf(), mask);
        }

        let mask = mask | Mask::RECURSIVE;
        let subdirs = self.subdirectories(path)?;
        if let Some(dir) = subdirs.iter().find(|dir| self.paths.contains_key(*dir)) {
            return Err(Error::DuplicatePath(dir.clone()));
        }

        let root = self.insert_tree(channel, path, subdirs, mask)?;
        self.recursive = true;

        Ok(root)
    }

    /// Removes the watch for `path`
    ///
    /// Once any recursive watch has been added, this also removes the watches
    /// of every directory currently below `path`. Each of them must be
    /// registered, otherwise [`Error::Inconsistent`] is returned and nothing
    /// is removed.
    pub(crate) fn remove(&mut self, channel: &Channel, path: &Path) -> Result<()> {
        if !self.paths.contains_key(path) {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        // A root that is gone from disk has nothing left to sweep.
        let subdirs = if self.recursive && path.is_dir() {
            let subdirs = self.subdirectories(path)?;
            if let Some(dir) = subdirs.iter().find(|dir| !self.paths.contains_key(*dir)) {
                return Err(Error::Inconsistent(dir.clone()));
            }
            subdirs
        } else {
            Vec::new()
        };

        self.take(channel, path)?;
        for dir in &subdirs {
            self.take(channel, dir)?;
        }

        debug!(path = %path.display(), subdirectories = subdirs.len(), "removed watch");
        Ok(())
    }

    /// Drops the mapping for a watch the kernel has already removed
    ///
    /// Called for every `IN_IGNORED` record. Returns the path the watch was
    /// registered for, or `None` if `wd` was not (or no longer) registered.
    pub(crate) fn forget(&mut self, wd: WatchDescriptor) -> Option<PathBuf> {
        let path = self.descriptors.remove(&wd)?;
        self.paths.remove(&path);

        debug!(path = %path.display(), wd = wd.0, "watch dropped by the kernel");
        Some(path)
    }

    pub(crate) fn path(&self, wd: WatchDescriptor) -> Option<&Path> {
        self.descriptors.get(&wd).map(PathBuf::as_path)
    }

    pub(crate) fn descriptor(&self, path: &Path) -> Option<WatchDescriptor> {
        self.paths.get(path).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Path, WatchDescriptor)> {
        self.paths.iter().map(|(path, wd)| (path.as_path(), *wd))
    }

    /// Installs the watches of a recursive registration, root first
    ///
    /// If any of them fails, the ones installed by this call are removed
    /// again, in reverse order, and the failure is returned.
    fn insert_tree(
        &mut self,
        channel: &Channel,
        root: &Path,
        subdirs: Vec<PathBuf>,
        mask: Mask,
    ) -> Result<WatchDescriptor> {
        let wd = self.insert(channel, root.to_path_buf(), mask)?;

        let mut added = Vec::with_capacity(subdirs.len());
        for dir in subdirs {
            match self.insert(channel, dir.clone(), mask) {
                Ok(_) => added.push(dir),
                Err(error) => {
                    // Rollback failures are dropped; the caller gets the add error.
                    for dir in added.iter().rev() {
                        let _ = self.take(channel, dir);
                    }
                    let _ = self.take(channel, root);
                    return Err(error);
                }
            }
        }

        debug!(path = %root.display(), subdirectories = added.len(), "added recursive watch");
        Ok(wd)
    }

    /// Installs one kernel watch and records both directions of the mapping
    fn insert(&mut self, channel: &Channel, path: PathBuf, mask: Mask)
        -> Result<WatchDescriptor>
    {
        let wd = channel.add_watch(&path, mask)?;

        // Another path to an already watched inode. The kernel has updated
        // that watch rather than creating a new one.
        if let Some(existing) = self.descriptors.get(&wd) {
            return Err(Error::Aliased {
                path,
                existing: existing.clone(),
            });
        }

        debug!(path = %path.display(), wd = wd.0, ?mask, "added watch");
        self.paths.insert(path.clone(), wd);
        self.descriptors.insert(wd, path);

        Ok(wd)
    }

    /// Removes one kernel watch and both directions of its mapping
    ///
    /// `EINVAL` means the kernel has already dropped the watch (its inode is
    /// gone, or it was a one-shot watch). The stale entry is removed, and the
    /// error still returned.
    fn take(&mut self, channel: &Channel, path: &Path) -> Result<()> {
        let wd = match self.paths.get(path) {
            Some(wd) => *wd,
            None => return Err(Error::Inconsistent(path.to_path_buf())),
        };

        let result = channel.rm_watch(wd);
        if let Err(error) = &result {
            if error.raw_os_error() != Some(libc::EINVAL) {
                return result.map_err(Error::from);
            }
        }

        self.paths.remove(path);
        self.descriptors.remove(&wd);

        result.map_err(Error::from)
    }

    /// Every directory below `root`, in no particular order
    fn subdirectories(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();

        let walk = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks);
        for entry in walk {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }

        Ok(dirs)
    }
}
