use std::io::Read;
use std::os::fd::AsFd;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::channel::Channel;
use crate::codec::{Message, TERMINATOR};
use crate::error::Result;
use crate::reader::{Arrival, ChannelPair};

/// Splits one channel's bytes into bounded lines.
///
/// At most `max_line` bytes of a line are kept, terminator included. Bytes
/// past that are counted into [`Message::cropped`] and never copied, so memory
/// use does not depend on line length. When a line is cut, its last kept byte
/// is replaced by the terminator.
#[derive(Debug, Clone)]
pub struct LineFramer {
    max_line: usize,
}

impl LineFramer {
    /// Create a framer keeping at most `max_line` bytes per line (minimum 1).
    pub fn new(max_line: usize) -> Self {
        Self {
            max_line: max_line.max(1),
        }
    }

    /// Produce the next line from `channel`, blocking until one is complete.
    ///
    /// Buffered bytes are used first. Without a terminator in the buffer this
    /// waits on both channels until `channel` has more data or closes. If the
    /// channel closes mid-line, the partial line is returned with a
    /// synthesized terminator and `terminated = false`. If it closes with
    /// nothing buffered, an empty message is returned.
    pub fn next_message<R: Read + AsFd>(
        &self,
        channels: &mut ChannelPair<R>,
        channel: Channel,
    ) -> Result<Message> {
        let mut content = BytesMut::with_capacity(self.max_line);
        let mut line_len = 0usize;

        loop {
            let reader = channels.reader_mut(channel);
            let pending = reader.pending();

            if let Some(pos) = pending.iter().position(|&b| b == TERMINATOR) {
                let line = &pending[..=pos];
                self.copy_bounded(&mut content, line);
                line_len += line.len();
                reader.consume(pos + 1);
                return Ok(self.finish(channel, content, line_len, true));
            }

            self.copy_bounded(&mut content, pending);
            line_len += pending.len();
            reader.clear();

            if reader.is_exhausted() {
                break;
            }
            if channels.wait_for(channel)? == Arrival::Closed {
                break;
            }
        }

        if line_len == 0 {
            return Ok(Message::empty());
        }
        Ok(self.finish(channel, content, line_len, false))
    }

    fn copy_bounded(&self, content: &mut BytesMut, bytes: &[u8]) {
        let room = self.max_line - content.len();
        let n = room.min(bytes.len());
        content.extend_from_slice(&bytes[..n]);
    }

    fn finish(
        &self,
        channel: Channel,
        mut content: BytesMut,
        line_len: usize,
        terminated: bool,
    ) -> Message {
        // An unterminated line gets a synthesized terminator, which counts
        // towards its length.
        let line_len = if terminated { line_len } else { line_len + 1 };
        if !terminated || line_len > self.max_line {
            content.truncate(self.max_line - 1);
            content.put_u8(TERMINATOR);
        }

        let message = Message {
            content: content.freeze(),
            cropped: line_len.saturating_sub(self.max_line),
            terminated,
        };
        trace!(
            %channel,
            len = message.content.len(),
            cropped = message.cropped,
            terminated,
            "framed line"
        );
        message
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(crate::codec::DEFAULT_MAX_LINE)
    }
}
