use std::{
    ffi::CString,
    io,
    mem,
    os::{
        raw::c_int,
        unix::{
            ffi::OsStrExt,
            io::{
                AsRawFd,
                RawFd,
            },
        },
    },
    path::Path,
};

use inotify_sys as ffi;
use libc::{
    c_void,
    size_t,
};

use crate::mask::Mask;
use crate::watches::WatchDescriptor;


/// Longest file name the kernel will report, see `limits.h`
const NAME_MAX: usize = 255;

/// Smallest read that is guaranteed to fit any single event
///
/// One header plus the longest name and its terminating NUL.
pub(crate) const MIN_READ_SIZE: usize =
    mem::size_of::<ffi::inotify_event>() + NAME_MAX + 1;


/// The inotify file descriptor
///
/// Owned by exactly one [`Inotify`] for its whole lifetime and closed exactly
/// once, either through [`Channel::close`] or on drop.
///
/// [`Inotify`]: crate::Inotify
#[derive(Debug)]
pub(crate) struct Channel {
    fd: RawFd,
}

impl Channel {
    /// Opens a new, non-blocking inotify instance
    pub(crate) fn open() -> io::Result<Self> {
        // `IN_NONBLOCK` is required: blocking is handled by waiting for
        // readiness, never by the read itself.
        let fd = unsafe { ffi::inotify_init1(ffi::IN_CLOEXEC | ffi::IN_NONBLOCK) };

        match fd {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(Channel { fd }),
        }
    }

    pub(crate) fn add_watch(&self, path: &Path, mask: Mask)
        -> io::Result<WatchDescriptor>
    {
        let path = CString::new(path.as_os_str().as_bytes())?;

        let wd = unsafe {
            ffi::inotify_add_watch(
                self.fd,
                path.as_ptr() as *const _,
                mask.bits(),
            )
        };

        match wd {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(WatchDescriptor(wd)),
        }
    }

    pub(crate) fn rm_watch(&self, wd: WatchDescriptor) -> io::Result<()> {
        let result = unsafe { ffi::inotify_rm_watch(self.fd, wd.0) };
        match result {
            0  => Ok(()),
            -1 => Err(io::Error::last_os_error()),
            _  => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("unexpected return code from inotify_rm_watch ({})", result),
            )),
        }
    }

    /// Number of bytes the next read would return, as reported by `FIONREAD`
    pub(crate) fn pending_bytes(&self) -> io::Result<usize> {
        let mut pending: c_int = 0;
        let result = unsafe {
            libc::ioctl(self.fd, libc::FIONREAD, &mut pending as *mut c_int)
        };

        match result {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(pending.max(0) as usize),
        }
    }

    /// Non-blocking read into `buffer`
    ///
    /// Returns `WouldBlock` if no event is queued. The kernel only ever
    /// returns whole records.
    pub(crate) fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let len = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut c_void,
                buffer.len() as size_t,
            )
        };

        match len {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(len as usize),
        }
    }

    /// Sizes `buffer` to the queued byte count and reads into it
    ///
    /// A count of zero can race with the kernel queueing an event, so the
    /// read still goes ahead, sized to fit one event. The read result is what
    /// decides whether anything was ready.
    pub(crate) fn read_pending(&self, buffer: &mut Vec<u8>) -> io::Result<usize> {
        let pending = self.pending_bytes()?;
        let size = if pending == 0 { MIN_READ_SIZE } else { pending };

        buffer.clear();
        buffer.resize(size, 0);

        let len = self.read(buffer)?;
        buffer.truncate(len);

        Ok(len)
    }

    /// Closes the descriptor, reporting any error from `close`
    pub(crate) fn close(mut self) -> io::Result<()> {
        let result = unsafe { libc::close(self.fd) };
        self.fd = -1;
        match result {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }
}

impl AsRawFd for Channel {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        if self.fd != -1 {
            unsafe { libc::close(self.fd); }
        }
    }
}
