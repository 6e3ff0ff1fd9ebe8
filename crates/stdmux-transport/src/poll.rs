use std::io::ErrorKind;
use std::os::fd::{AsRawFd, BorrowedFd};

use tracing::trace;

use crate::error::{Result, TransportError};

/// Readiness of one handle after [`wait_readable`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// Data is available (or a zero-length read will report EOF).
    pub readable: bool,
    /// The writing side has closed.
    pub hangup: bool,
    /// The handle is in an error state or invalid.
    pub error: bool,
}

impl Readiness {
    fn from_revents(revents: libc::c_short) -> Self {
        Self {
            readable: revents & libc::POLLIN != 0,
            hangup: revents & libc::POLLHUP != 0,
            error: revents & (libc::POLLERR | libc::POLLNVAL) != 0,
        }
    }

    /// True if a read or a closure check should be performed.
    pub fn is_ready(self) -> bool {
        self.readable || self.hangup || self.error
    }
}

/// Block until at least one of two handles is readable or closed.
///
/// `None` slots are left out of the wait. There is no timeout. `EINTR` is
/// retried; any other failure is returned as [`TransportError::Poll`].
pub fn wait_readable(handles: [Option<BorrowedFd<'_>>; 2]) -> Result<[Readiness; 2]> {
    if handles.iter().all(Option::is_none) {
        return Err(TransportError::Poll(std::io::Error::new(
            ErrorKind::InvalidInput,
            "no handles to wait on",
        )));
    }

    // poll(2) ignores entries with a negative fd.
    let mut pfds = handles.map(|handle| libc::pollfd {
        fd: handle.map_or(-1, |fd| fd.as_raw_fd()),
        events: libc::POLLIN,
        revents: 0,
    });

    loop {
        // SAFETY: `pfds` is a valid, writable array of `pfds.len()` pollfd entries
        // and every non-negative fd is borrowed for the duration of the call.
        let rc = unsafe { libc::poll(pfds.as_mut_ptr(), pfds.len() as libc::nfds_t, -1) };
        if rc > 0 {
            break;
        }
        if rc == 0 {
            continue;
        }

        let err = std::io::Error::last_os_error();
        if err.kind() == ErrorKind::Interrupted {
            continue;
        }
        return Err(TransportError::Poll(err));
    }

    let ready = pfds.map(|pfd| Readiness::from_revents(pfd.revents));
    trace!(?ready, "readiness wait returned");
    Ok(ready)
}
