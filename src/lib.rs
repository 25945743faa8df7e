#![crate_name = "inotify_async"]
#![crate_type = "lib"]
#![warn(missing_docs)]

//! Asynchronous interface to inotify
//!
//! [Inotify][wiki] is a linux kernel mechanism for monitoring
//! changes to filesystems' contents.
//!
//! > The inotify API provides a mechanism for monitoring filesystem
//! > events. Inotify can be used to monitor individual files, or to
//! > monitor directories. When a directory is monitored, inotify will
//! > return events for the directory itself, and for files inside the
//! > directory.
//!
//! This crate keeps track of which path each watch belongs to, including
//! whole directory trees watched recursively, and turns the raw bytes read
//! from the inotify descriptor into [`Event`]s without blocking the calling
//! thread. Waiting for events is done by the [Tokio] reactor.
//!
//! Events are delivered exactly as the kernel queued them: nothing is
//! buffered beyond the kernel's own queue, coalesced, or deduplicated.
//!
//! # Example
//!
//! ```no_run
//! use inotify_async::{Inotify, Mask};
//!
//! # async fn run() -> inotify_async::Result<()> {
//! let inotify = Inotify::init()?;
//! inotify.add_watch("/tmp/w", Some(Mask::CREATE | Mask::DELETE), false)?;
//!
//! loop {
//!     for event in inotify.next_events().await? {
//!         println!("{:?}: {:?}", event.mask, inotify.event_path(&event));
//!     }
//! }
//! # }
//! ```
//!
//! See the [man page][inotify7] for the semantics of the underlying
//! interface.
//!
//! [wiki]: https://en.wikipedia.org/wiki/Inotify
//! [inotify7]: http://man7.org/linux/man-pages/man7/inotify.7.html
//! [Tokio]: https://tokio.rs


#[macro_use]
extern crate bitflags;

mod channel;
mod config;
mod error;
mod inotify;
mod mask;
mod watches;

pub mod events;

#[cfg(feature = "stream")]
mod stream;


pub use crate::config::Config;
pub use crate::error::{
    Error,
    Result,
};
pub use crate::events::{
    Event,
    Events,
};
pub use crate::inotify::Inotify;
pub use crate::mask::Mask;
pub use crate::watches::WatchDescriptor;

#[cfg(feature = "stream")]
pub use crate::stream::EventStream;
