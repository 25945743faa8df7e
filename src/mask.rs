use bitflags::Flags;
use inotify_sys as ffi;

bitflags! {
    /// Event kinds and watch options
    ///
    /// The same set of bits is used in both directions: passed to
    /// [`Inotify::add_watch`] to describe what to watch for and how, and
    /// returned in the `mask` field of every [`Event`] to describe what
    /// happened. Every constant is taken from the [`inotify_sys`] binding, so a
    /// flag missing from the binding is a build error rather than a silently
    /// smaller set.
    ///
    /// # Examples
    ///
    /// ``` rust
    /// use inotify_async::Mask;
    ///
    /// let mask = Mask::CREATE | Mask::DELETE;
    ///
    /// assert!(mask.contains(Mask::CREATE));
    /// assert!(Mask::ALL_EVENTS.contains(mask));
    /// assert!(!mask.contains(Mask::ISDIR));
    /// ```
    ///
    /// [`Inotify::add_watch`]: crate::Inotify::add_watch
    /// [`Event`]: crate::Event
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct Mask: u32 {
        /// File was accessed
        ///
        /// See [`inotify_sys::IN_ACCESS`].
        const ACCESS = ffi::IN_ACCESS;

        /// Metadata (permissions, timestamps, ...) changed
        ///
        /// See [`inotify_sys::IN_ATTRIB`].
        const ATTRIB = ffi::IN_ATTRIB;

        /// File opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_WRITE`].
        const CLOSE_WRITE = ffi::IN_CLOSE_WRITE;

        /// File or directory not opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_NOWRITE`].
        const CLOSE_NOWRITE = ffi::IN_CLOSE_NOWRITE;

        /// File/directory created in watched directory
        ///
        /// See [`inotify_sys::IN_CREATE`].
        const CREATE = ffi::IN_CREATE;

        /// File/directory deleted from watched directory
        ///
        /// See [`inotify_sys::IN_DELETE`].
        const DELETE = ffi::IN_DELETE;

        /// Watched file/directory was itself deleted
        ///
        /// See [`inotify_sys::IN_DELETE_SELF`].
        const DELETE_SELF = ffi::IN_DELETE_SELF;

        /// File was modified
        ///
        /// See [`inotify_sys::IN_MODIFY`].
        const MODIFY = ffi::IN_MODIFY;

        /// Watched file/directory was itself moved
        ///
        /// See [`inotify_sys::IN_MOVE_SELF`].
        const MOVE_SELF = ffi::IN_MOVE_SELF;

        /// File was renamed/moved; watched directory contained old name
        ///
        /// Carries the same non-zero cookie as the matching
        /// [`MOVED_TO`](Self::MOVED_TO) event.
        ///
        /// See [`inotify_sys::IN_MOVED_FROM`].
        const MOVED_FROM = ffi::IN_MOVED_FROM;

        /// File was renamed/moved; watched directory contains new name
        ///
        /// See [`inotify_sys::IN_MOVED_TO`].
        const MOVED_TO = ffi::IN_MOVED_TO;

        /// File or directory was opened
        ///
        /// See [`inotify_sys::IN_OPEN`].
        const OPEN = ffi::IN_OPEN;

        /// File system containing the watched object was unmounted
        ///
        /// Only ever reported, never requested.
        ///
        /// See [`inotify_sys::IN_UNMOUNT`].
        const UNMOUNT = ffi::IN_UNMOUNT;

        /// Event queue overflowed
        ///
        /// The kernel dropped events. The record carrying this bit has a
        /// watch descriptor of `-1`.
        ///
        /// See [`inotify_sys::IN_Q_OVERFLOW`].
        const Q_OVERFLOW = ffi::IN_Q_OVERFLOW;

        /// Watch was removed, explicitly or by the kernel
        ///
        /// See [`inotify_sys::IN_IGNORED`].
        const IGNORED = ffi::IN_IGNORED;

        /// Subject of the event is a directory
        ///
        /// See [`inotify_sys::IN_ISDIR`].
        const ISDIR = ffi::IN_ISDIR;

        /// Only watch path, if it is a directory
        ///
        /// See [`inotify_sys::IN_ONLYDIR`].
        const ONLYDIR = ffi::IN_ONLYDIR;

        /// Don't dereference the path if it is a symbolic link
        ///
        /// See [`inotify_sys::IN_DONT_FOLLOW`].
        const DONT_FOLLOW = ffi::IN_DONT_FOLLOW;

        /// Filter events for directory entries that have been unlinked
        ///
        /// See [`inotify_sys::IN_EXCL_UNLINK`].
        const EXCL_UNLINK = ffi::IN_EXCL_UNLINK;

        /// If a watch for the inode exists, amend it instead of replacing it
        ///
        /// See [`inotify_sys::IN_MASK_ADD`].
        const MASK_ADD = ffi::IN_MASK_ADD;

        /// Only receive one event, then remove the watch
        ///
        /// See [`inotify_sys::IN_ONESHOT`].
        const ONESHOT = ffi::IN_ONESHOT;

        /// Every event kind, without structural or option bits
        ///
        /// See [`inotify_sys::IN_ALL_EVENTS`].
        const ALL_EVENTS = ffi::IN_ALL_EVENTS;

        /// Both [`MOVED_FROM`](Self::MOVED_FROM) and
        /// [`MOVED_TO`](Self::MOVED_TO)
        const MOVE = ffi::IN_MOVE;

        /// Both [`CLOSE_WRITE`](Self::CLOSE_WRITE) and
        /// [`CLOSE_NOWRITE`](Self::CLOSE_NOWRITE)
        const CLOSE = ffi::IN_CLOSE;
    }
}

/// Prefix the binding uses for every watch flag
const SYMBOL_PREFIX: &str = "IN_";

const EVENT_KINDS: u32 = ffi::IN_ACCESS
    | ffi::IN_MODIFY
    | ffi::IN_ATTRIB
    | ffi::IN_CLOSE_WRITE
    | ffi::IN_CLOSE_NOWRITE
    | ffi::IN_OPEN
    | ffi::IN_MOVED_FROM
    | ffi::IN_MOVED_TO
    | ffi::IN_CREATE
    | ffi::IN_DELETE
    | ffi::IN_DELETE_SELF
    | ffi::IN_MOVE_SELF;

const NON_EVENT_BITS: u32 = ffi::IN_UNMOUNT
    | ffi::IN_Q_OVERFLOW
    | ffi::IN_IGNORED
    | ffi::IN_ISDIR
    | ffi::IN_ONLYDIR
    | ffi::IN_DONT_FOLLOW
    | ffi::IN_EXCL_UNLINK
    | ffi::IN_MASK_ADD
    | ffi::IN_ONESHOT;

// The binding's table must agree with the closed set above.
const _: () = assert!(ffi::IN_ALL_EVENTS == EVENT_KINDS);
const _: () = assert!(EVENT_KINDS & NON_EVENT_BITS == 0);

impl Mask {
    /// Bits added to every watch installed by a recursive registration
    ///
    /// Keeps structural changes inside a watched tree observable, whatever
    /// the caller asked for.
    pub const RECURSIVE: Mask = Mask::ISDIR.union(Mask::CREATE).union(Mask::DELETE);

    /// Look up a flag by its name in the binding, e.g. `"IN_CLOSE_WRITE"`
    ///
    /// Returns `None` for names without the `IN_` prefix and for names the
    /// binding does not define.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        symbol
            .strip_prefix(SYMBOL_PREFIX)
            .and_then(Self::from_name)
    }

    /// All single-bit flags, keyed by their binding name
    ///
    /// Composites ([`ALL_EVENTS`](Self::ALL_EVENTS), [`MOVE`](Self::MOVE),
    /// [`CLOSE`](Self::CLOSE)) are left out, but [`Mask::from_symbol`] still
    /// resolves them.
    pub fn symbols() -> impl Iterator<Item = (String, Mask)> {
        Self::FLAGS
            .iter()
            .filter(|flag| flag.value().bits().is_power_of_two())
            .map(|flag| (format!("{}{}", SYMBOL_PREFIX, flag.name()), *flag.value()))
    }

    /// Whether any of the twelve event-kind bits is set
    pub fn is_event(&self) -> bool {
        self.intersects(Self::ALL_EVENTS)
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::ALL_EVENTS
    }
}
