use std::{
    collections::VecDeque,
    pin::Pin,
    task::{
        ready,
        Context,
        Poll,
    },
};

use futures_core::Stream;

use crate::error::Result;
use crate::events::Event;
use crate::inotify::Inotify;


/// Stream of inotify events
///
/// Yields the events of each batch read from the kernel one at a time, in
/// delivery order. Returned by [`Inotify::event_stream`]. The stream borrows
/// the [`Inotify`], so watches can still be added and removed while it is
/// alive.
///
/// Events of a batch that has been read but not yet yielded are lost if the
/// stream is dropped. Use [`Inotify::next_events`] where that matters.
#[derive(Debug)]
pub struct EventStream<'a> {
    inotify: &'a Inotify,
    unused: VecDeque<Event>,
}

impl<'a> EventStream<'a> {
    pub(crate) fn new(inotify: &'a Inotify) -> Self {
        EventStream {
            inotify,
            unused: VecDeque::new(),
        }
    }
}

impl Stream for EventStream<'_> {
    type Item = Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<Self::Item>>
    {
        let this = &mut *self;

        loop {
            if let Some(event) = this.unused.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            let mut guard = ready!(this.inotify.fd().poll_read_ready(cx))?;

            match this.inotify.read_batch(&mut guard) {
                Some(Ok(events)) => this.unused.extend(events),
                Some(Err(error)) => return Poll::Ready(Some(Err(error))),
                None => continue,
            }
        }
    }
}
