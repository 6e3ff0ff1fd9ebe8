use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig, Message, DEFAULT_PREFIX_WIDTH};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes labelled lines to any `Write` sink.
///
/// Every frame is delivered completely: short writes are retried with the
/// remaining bytes until done or until the sink fails.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    prefix_width: usize,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with the default prefix width.
    pub fn new(inner: T) -> Self {
        Self::with_prefix_width(inner, DEFAULT_PREFIX_WIDTH)
    }

    /// Create a new frame writer using the prefix width from `config`.
    pub fn with_config(inner: T, config: &FrameConfig) -> Self {
        Self::with_prefix_width(inner, config.prefix_width)
    }

    fn with_prefix_width(inner: T, prefix_width: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            prefix_width,
        }
    }

    /// Write one message and its annotations (blocking).
    ///
    /// Returns the number of bytes written. An empty message writes nothing.
    pub fn write_message(&mut self, label: &str, message: &Message) -> Result<usize> {
        if message.is_empty() {
            return Ok(0);
        }

        self.buf.clear();
        encode_frame(label, message, self.prefix_width, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::Write(std::io::Error::from(ErrorKind::WriteZero))),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Write(err)),
            }
        }

        self.flush()?;
        Ok(offset)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Write(err)),
            }
        }
    }

}

impl<T> FrameWriter<T> {
    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
