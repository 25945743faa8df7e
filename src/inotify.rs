use std::{
    io,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

use tokio::io::unix::{
    AsyncFd,
    AsyncFdReadyGuard,
};
use tracing::{
    trace,
    warn,
};

use crate::channel::Channel;
use crate::config::Config;
use crate::error::Result;
use crate::events::{
    decode,
    Event,
};
use crate::mask::Mask;
use crate::watches::{
    WatchDescriptor,
    Watches,
};


/// An inotify instance
///
/// Owns the inotify file descriptor and the bookkeeping for every watch
/// added through it. Watches are managed with [`Inotify::add_watch`] and
/// [`Inotify::del_watch`]; events are retrieved with
/// [`Inotify::next_events`].
///
/// All methods take `&self`. Watch changes are serialized among themselves,
/// and reads are serialized among themselves, so an `Inotify` can be shared
/// between a task that reads events and code that adds or removes watches.
///
/// Must be created from within a Tokio runtime.
#[derive(Debug)]
pub struct Inotify {
    fd: AsyncFd<Channel>,
    watches: Mutex<Watches>,
    buffer: Mutex<Vec<u8>>,
}

impl Inotify {
    /// Creates an [`Inotify`] instance with the default [`Config`]
    ///
    /// # Errors
    ///
    /// Returns the error from `inotify_init1`, or from registering the
    /// descriptor with the Tokio reactor.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn init() -> io::Result<Inotify> {
        Self::with_config(Config::default())
    }

    /// Creates an [`Inotify`] instance with the given [`Config`]
    pub fn with_config(config: Config) -> io::Result<Inotify> {
        let channel = Channel::open()?;

        Ok(Inotify {
            fd: AsyncFd::new(channel)?,
            watches: Mutex::new(Watches::new(config)),
            buffer: Mutex::new(Vec::new()),
        })
    }

    /// Watches `path`
    ///
    /// `mask` describes what to watch for; `None` uses the configured
    /// [`Config::default_mask`]. If `recursive` is set, every directory that
    /// currently exists below `path` is watched too, with [`Mask::RECURSIVE`]
    /// added to the mask. Directories created later are not picked up.
    ///
    /// Returns the descriptor of the watch on `path` itself.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicatePath`] if `path`, or for a recursive watch any
    ///   directory below it, is already watched by this instance. Nothing is
    ///   changed.
    /// - [`Error::Aliased`] if `path` is another name for an inode that is
    ///   already watched.
    /// - [`Error::Io`] with the error from `inotify_add_watch` or from walking
    ///   the directory tree, unmodified and not retried.
    ///
    /// [`Error::DuplicatePath`]: crate::Error::DuplicatePath
    /// [`Error::Aliased`]: crate::Error::Aliased
    /// [`Error::Io`]: crate::Error::Io
    pub fn add_watch<P>(&self, path: P, mask: Option<Mask>, recursive: bool)
        -> Result<WatchDescriptor>
        where P: AsRef<Path>
    {
        self.watches()
            .add(self.fd.get_ref(), path.as_ref(), mask, recursive)
    }

    /// Stops watching `path`
    ///
    /// Once any recursive watch has been added to this instance, the watches
    /// of every directory below `path` are removed as well.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` is not watched.
    /// - [`Error::Inconsistent`] if a directory below `path` has no watch.
    ///   Nothing is removed in that case.
    /// - [`Error::Io`] with the error from `inotify_rm_watch`.
    ///
    /// [`Error::NotFound`]: crate::Error::NotFound
    /// [`Error::Inconsistent`]: crate::Error::Inconsistent
    /// [`Error::Io`]: crate::Error::Io
    pub fn del_watch<P>(&self, path: P) -> Result<()>
        where P: AsRef<Path>
    {
        self.watches().remove(self.fd.get_ref(), path.as_ref())
    }

    /// The path a watch descriptor was registered for
    pub fn watched_path(&self, wd: WatchDescriptor) -> Option<PathBuf> {
        self.watches().path(wd).map(Path::to_path_buf)
    }

    /// The descriptor of the watch on `path`
    pub fn watch_descriptor<P>(&self, path: P) -> Option<WatchDescriptor>
        where P: AsRef<Path>
    {
        self.watches().descriptor(path.as_ref())
    }

    /// All current watches, in no particular order
    pub fn watched(&self) -> Vec<(PathBuf, WatchDescriptor)> {
        self.watches()
            .iter()
            .map(|(path, wd)| (path.to_path_buf(), wd))
            .collect()
    }

    /// Number of current watches
    pub fn watch_count(&self) -> usize {
        self.watches().len()
    }

    /// Full path of the entry an event is about
    ///
    /// Joins the watched path with the event's name. Returns `None` if the
    /// event's watch is no longer registered, which includes the
    /// [`Mask::IGNORED`] record that ends every watch.
    pub fn event_path(&self, event: &Event) -> Option<PathBuf> {
        let watches = self.watches();
        let dir = watches.path(event.wd)?;

        if event.name.as_os_str().is_empty() {
            Some(dir.to_path_buf())
        } else {
            Some(dir.join(&event.name))
        }
    }

    /// Waits for events and returns the next batch
    ///
    /// Each call performs one successful read and returns everything it
    /// contained, in the order the kernel delivered it. If nothing is queued,
    /// the task is suspended until the inotify descriptor becomes readable.
    ///
    /// # Cancel safety
    ///
    /// The only suspension point is the wait for readability. Once a read has
    /// returned data, the batch is decoded and returned without yielding, so
    /// dropping the future never loses or duplicates events.
    ///
    /// # Errors
    ///
    /// Errors from `ioctl` or `read` are returned unmodified, except for
    /// would-block, which puts the task back to sleep.
    /// [`Error::Protocol`] is returned if the buffer does not decode cleanly;
    /// no events from that batch are returned.
    ///
    /// [`Error::Protocol`]: crate::Error::Protocol
    pub async fn next_events(&self) -> Result<Vec<Event>> {
        loop {
            let mut guard = self.fd.readable().await?;

            if let Some(batch) = self.read_batch(&mut guard) {
                return batch;
            }
        }
    }

    /// Returns a stream of single events
    ///
    /// See [`EventStream`](crate::EventStream).
    #[cfg(feature = "stream")]
    pub fn event_stream(&self) -> crate::stream::EventStream<'_> {
        crate::stream::EventStream::new(self)
    }

    /// Closes the inotify instance
    ///
    /// Dropping an `Inotify` closes it too, ignoring any error. This method
    /// reports it instead.
    pub fn close(self) -> io::Result<()> {
        self.fd.into_inner().close()
    }

    /// Reads and decodes one batch, if the descriptor is really readable
    ///
    /// Returns `None` on would-block, after clearing the readiness recorded
    /// in `guard`. The query, read, and decode all happen under the buffer
    /// lock, so concurrent callers never split or repeat a batch.
    ///
    /// Watches the kernel reports as removed (`IN_IGNORED`) are dropped from
    /// the registry before the batch is returned.
    pub(crate) fn read_batch(&self, guard: &mut AsyncFdReadyGuard<'_, Channel>)
        -> Option<Result<Vec<Event>>>
    {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);

        let len = match guard.try_io(|fd| fd.get_ref().read_pending(&mut buffer)) {
            Ok(Ok(len))    => len,
            Ok(Err(error)) => return Some(Err(error.into())),
            Err(_would_block) => {
                trace!("inotify descriptor not ready");
                return None;
            }
        };

        let batch = decode(&buffer[..len]);

        if let Ok(events) = &batch {
            trace!(
                bytes = len,
                events = events.len(),
                notices = events.iter().filter(|event| !event.mask.is_event()).count(),
                "read inotify events"
            );

            let mut watches = self.watches();
            for event in events {
                if event.mask.contains(Mask::IGNORED) {
                    watches.forget(event.wd);
                }
                if event.mask.contains(Mask::Q_OVERFLOW) {
                    warn!("inotify event queue overflowed, events were lost");
                }
            }
        }

        Some(batch)
    }

    #[cfg(feature = "stream")]
    pub(crate) fn fd(&self) -> &AsyncFd<Channel> {
        &self.fd
    }

    fn watches(&self) -> MutexGuard<'_, Watches> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
