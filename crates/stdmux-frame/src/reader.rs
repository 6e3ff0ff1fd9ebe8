use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, BorrowedFd};

use bytes::{Buf, BytesMut};
use stdmux_transport::{wait_readable, Readiness};
use tracing::debug;

use crate::channel::Channel;
use crate::error::{FrameError, Result};

/// Buffered reader for one channel.
///
/// Holds at most `capacity` unconsumed bytes. Consuming from the front is an
/// `advance` on the underlying `BytesMut`, so no bytes are shifted per line.
/// Once end of stream is seen no further reads are issued, but buffered
/// bytes stay available until consumed.
pub struct ChannelReader<R> {
    inner: R,
    channel: Channel,
    buf: BytesMut,
    capacity: usize,
    exhausted: bool,
}

impl<R: Read> ChannelReader<R> {
    /// Create a reader for `channel` holding up to `capacity` bytes.
    pub fn new(channel: Channel, inner: R, capacity: usize) -> Self {
        Self {
            inner,
            channel,
            buf: BytesMut::with_capacity(capacity),
            capacity,
            exhausted: false,
        }
    }

    /// Read once into spare buffer capacity.
    ///
    /// Returns the number of bytes read. A zero-length read marks the channel
    /// exhausted. Returns `Ok(0)` without reading if the channel is already
    /// exhausted or the buffer is full.
    pub fn fill(&mut self) -> Result<usize> {
        if self.exhausted || !self.has_room() {
            return Ok(0);
        }

        let start = self.buf.len();
        self.buf.resize(self.capacity, 0);
        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    if n == 0 {
                        self.mark_exhausted();
                    }
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Read {
                        channel: self.channel,
                        source: err,
                    });
                }
            }
        }
    }
}

impl<R> ChannelReader<R> {
    /// Buffered bytes not yet consumed.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes not yet consumed.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Drop `n` bytes from the front of the buffer.
    pub fn consume(&mut self, n: usize) {
        self.buf.advance(n);
    }

    /// Drop every buffered byte.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// True if another read fits in the buffer.
    pub fn has_room(&self) -> bool {
        self.buf.len() < self.capacity
    }

    /// True once end of stream (or a hang-up) has been observed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// True if exhausted and nothing is left to consume.
    pub fn is_drained(&self) -> bool {
        self.exhausted && self.buf.is_empty()
    }

    /// Stop reading from this channel.
    pub fn mark_exhausted(&mut self) {
        if !self.exhausted {
            debug!(channel = %self.channel, pending = self.buf.len(), "channel exhausted");
            self.exhausted = true;
        }
    }
}

impl<R: AsFd> ChannelReader<R> {
    /// Handle to include in a readiness wait, if this channel can take more data.
    fn wait_handle(&self) -> Option<BorrowedFd<'_>> {
        if self.exhausted || !self.has_room() {
            None
        } else {
            Some(self.inner.as_fd())
        }
    }
}

/// Outcome of [`ChannelPair::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// New bytes are buffered on the awaited channel.
    Data,
    /// The awaited channel reached end of stream.
    Closed,
}

/// Readiness wait over both channel handles.
type WaitFn = fn([Option<BorrowedFd<'_>>; 2]) -> stdmux_transport::Result<[Readiness; 2]>;

/// Both channel readers plus the readiness wait that covers them.
pub struct ChannelPair<R> {
    readers: [ChannelReader<R>; 2],
    wait: WaitFn,
}

impl<R: Read + AsFd> ChannelPair<R> {
    /// Create readers for both channels with the same buffer capacity.
    pub fn new(primary: R, secondary: R, capacity: usize) -> Self {
        Self {
            readers: [
                ChannelReader::new(Channel::Primary, primary, capacity),
                ChannelReader::new(Channel::Secondary, secondary, capacity),
            ],
            wait: wait_readable,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_wait(&mut self, wait: WaitFn) {
        self.wait = wait;
    }

    /// Block until `channel` has new bytes buffered or is closed.
    ///
    /// A single wait covers both handles. Data that shows up on the other
    /// channel meanwhile is read into that channel's buffer, so its readiness
    /// is not lost. Handles that are exhausted or have a full buffer are left
    /// out of the wait. Returns [`Arrival::Data`] immediately if the awaited
    /// buffer is already full.
    pub fn wait_for(&mut self, channel: Channel) -> Result<Arrival> {
        let target = channel.index();
        let other = channel.other().index();

        loop {
            if self.readers[target].is_exhausted() {
                return Ok(Arrival::Closed);
            }
            if !self.readers[target].has_room() {
                return Ok(Arrival::Data);
            }

            let ready = (self.wait)([
                self.readers[0].wait_handle(),
                self.readers[1].wait_handle(),
            ])?;

            if ready[other].is_ready() {
                self.service(other, ready[other])?;
            }
            if ready[target].is_ready() && self.service(target, ready[target])? > 0 {
                return Ok(Arrival::Data);
            }
        }
    }

    fn service(&mut self, index: usize, ready: Readiness) -> Result<usize> {
        let reader = &mut self.readers[index];
        if ready.readable || ready.error {
            reader.fill()
        } else {
            reader.mark_exhausted();
            Ok(0)
        }
    }
}

impl<R> ChannelPair<R> {
    /// Borrow the reader for `channel`.
    pub fn reader(&self, channel: Channel) -> &ChannelReader<R> {
        &self.readers[channel.index()]
    }

    /// Mutably borrow the reader for `channel`.
    pub fn reader_mut(&mut self, channel: Channel) -> &mut ChannelReader<R> {
        &mut self.readers[channel.index()]
    }

    /// True once both channels are exhausted with empty buffers.
    pub fn is_drained(&self) -> bool {
        self.readers.iter().all(ChannelReader::is_drained)
    }
}
