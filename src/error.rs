use std::{
    io,
    path::PathBuf,
};

use thiserror::Error;


/// Errors returned by this crate
///
/// Operating system errors are passed through untouched as [`Error::Io`].
/// The remaining variants are raised by the crate itself.
#[derive(Debug, Error)]
pub enum Error {
    /// A syscall failed
    ///
    /// Carries the error exactly as the kernel reported it. Use
    /// [`io::Error::raw_os_error`] to get at the errno.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The path is already registered with this instance
    #[error("already watching {}", .0.display())]
    DuplicatePath(PathBuf),

    /// The path is not registered with this instance
    #[error("not watching {}", .0.display())]
    NotFound(PathBuf),

    /// The kernel handed out a descriptor that is already mapped to
    /// another path, meaning both paths refer to the same inode
    #[error("{} shares its watch with {}", path.display(), existing.display())]
    Aliased {
        /// The path that was being added
        path: PathBuf,
        /// The path already holding the descriptor
        existing: PathBuf,
    },

    /// A directory inside a recursively watched tree has no watch
    ///
    /// The registry no longer mirrors the kernel's watch table.
    #[error("watch registry out of sync: no watch for {}", .0.display())]
    Inconsistent(PathBuf),

    /// An event buffer did not end on a record boundary
    #[error("malformed event buffer: record at offset {offset} overruns {len} bytes")]
    Protocol {
        /// Where the offending record starts
        offset: usize,
        /// Length of the whole buffer
        len: usize,
    },
}

/// Result type used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;
