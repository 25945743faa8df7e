//! Decoding of the records read from an inotify descriptor

use std::{
    ffi::OsStr,
    mem,
    os::unix::ffi::OsStrExt,
    path::PathBuf,
};

use inotify_sys as ffi;

use crate::error::{
    Error,
    Result,
};
use crate::mask::Mask;
use crate::watches::WatchDescriptor;


/// Size of the fixed record header: wd, mask, cookie, name length
pub(crate) const HEADER_SIZE: usize = 16;

const _: () = assert!(mem::size_of::<ffi::inotify_event>() == HEADER_SIZE);


/// Iterator over the records in one read result
///
/// Yields events in buffer order, which is the order the kernel delivered
/// them in. Yields an [`Error::Protocol`] and stops if a record overruns the
/// end of the buffer.
#[derive(Debug)]
pub struct Events<'a> {
    buffer: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Events<'a> {
    /// Iterates over the records in `buffer`
    ///
    /// `buffer` must be exactly what one successful read returned.
    pub fn new(buffer: &'a [u8]) -> Self {
        Events {
            buffer,
            pos: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.buffer.len() {
            return None;
        }

        match Event::from_buffer(&self.buffer[self.pos..]) {
            Some((step, event)) => {
                self.pos += step;
                Some(Ok(event))
            }
            None => {
                self.failed = true;
                Some(Err(Error::Protocol {
                    offset: self.pos,
                    len: self.buffer.len(),
                }))
            }
        }
    }
}

/// Decodes a whole read result
///
/// Either every record decodes and lands exactly on the end of the buffer,
/// or the batch is rejected as a whole. An empty buffer yields no events.
///
/// # Examples
///
/// ```
/// use inotify_async::events::decode;
///
/// assert!(decode(&[]).unwrap().is_empty());
/// assert!(decode(&[0; 7]).is_err());
/// ```
pub fn decode(buffer: &[u8]) -> Result<Vec<Event>> {
    Events::new(buffer).collect()
}


/// A decoded inotify event
///
/// # Examples
///
/// ```no_run
/// # async fn run() -> inotify_async::Result<()> {
/// use inotify_async::{Inotify, Mask};
///
/// let inotify = Inotify::init()?;
/// inotify.add_watch("/tmp/w", Some(Mask::CREATE | Mask::DELETE), false)?;
///
/// for event in inotify.next_events().await? {
///     if event.mask.contains(Mask::CREATE) {
///         println!("created: {:?}", event.name);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Identifies the watch this event originates from
    ///
    /// Equal to what [`Inotify::add_watch`] returned for the watched path.
    /// Queue overflow records carry a descriptor of `-1`.
    ///
    /// [`Inotify::add_watch`]: crate::Inotify::add_watch
    pub wd: WatchDescriptor,

    /// What happened
    ///
    /// Bits unknown to [`Mask`] are kept as they are.
    pub mask: Mask,

    /// Connects the two halves of a rename
    ///
    /// Zero for everything except [`Mask::MOVED_FROM`] and
    /// [`Mask::MOVED_TO`], which share one non-zero value per rename.
    pub cookie: u32,

    /// Name of the directory entry the event is about
    ///
    /// Empty when the event concerns the watched object itself.
    pub name: PathBuf,
}

impl Event {
    /// Decodes the record at the start of `buffer`
    ///
    /// Returns the number of bytes the record occupies and the event, or
    /// `None` if the header or the name runs past the end of `buffer`.
    pub(crate) fn from_buffer(buffer: &[u8]) -> Option<(usize, Self)> {
        let header = buffer.get(..HEADER_SIZE)?;

        let wd     = i32::from_ne_bytes(field(header, 0));
        let mask   = u32::from_ne_bytes(field(header, 4));
        let cookie = u32::from_ne_bytes(field(header, 8));
        let len    = u32::from_ne_bytes(field(header, 12)) as usize;

        let bytes_consumed = HEADER_SIZE.checked_add(len)?;
        let name = buffer.get(HEADER_SIZE..bytes_consumed)?;

        // Names are NUL-padded up to the record alignment.
        let end = name.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let name = PathBuf::from(OsStr::from_bytes(&name[..end]));

        let event = Event {
            wd    : WatchDescriptor(wd),
            mask  : Mask::from_bits_retain(mask),
            cookie,
            name,
        };

        Some((bytes_consumed, event))
    }

    /// Whether the subject of the event is a directory
    pub fn is_dir(&self) -> bool {
        self.mask.contains(Mask::ISDIR)
    }

    /// Whether `self` and `other` are the two halves of one rename
    ///
    /// Order doesn't matter; one must be [`Mask::MOVED_FROM`], the other
    /// [`Mask::MOVED_TO`], and they must share a non-zero cookie.
    pub fn pairs_with(&self, other: &Event) -> bool {
        let halves = (self.mask.contains(Mask::MOVED_FROM) && other.mask.contains(Mask::MOVED_TO))
            || (self.mask.contains(Mask::MOVED_TO) && other.mask.contains(Mask::MOVED_FROM));

        halves && self.cookie != 0 && self.cookie == other.cookie
    }
}

fn field(header: &[u8], at: usize) -> [u8; 4] {
    [header[at], header[at + 1], header[at + 2], header[at + 3]]
}
