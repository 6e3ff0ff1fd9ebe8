use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Line terminator byte.
pub const TERMINATOR: u8 = b'\n';

/// Default maximum line length in bytes, terminator included.
pub const DEFAULT_MAX_LINE: usize = 72;

/// Default per-channel read buffer capacity in bytes.
pub const DEFAULT_READ_CAPACITY: usize = 1024;

/// Default width of the `[LABEL] ` prefix. Fits a six-character label.
pub const DEFAULT_PREFIX_WIDTH: usize = 9;

/// One framed line from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Line content. Empty, or at most `max_line` bytes ending in [`TERMINATOR`].
    pub content: Bytes,
    /// Number of source bytes dropped because the line exceeded `max_line`.
    pub cropped: usize,
    /// False if the channel closed before the line was terminated.
    pub terminated: bool,
}

impl Message {
    /// A message carrying nothing. Produces no output.
    pub fn empty() -> Self {
        Self {
            content: Bytes::new(),
            cropped: 0,
            terminated: true,
        }
    }

    /// True if there is nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Encode a message into its output lines.
///
/// Output format:
/// ```text
/// [LABEL] <content>                    prefix padded/truncated to `prefix_width`
/// LABEL: cropped <N> characters        only if cropped > 0
/// LABEL: no newline                    only if the source line was unterminated
/// ```
///
/// An empty message encodes to nothing.
pub fn encode_frame(label: &str, message: &Message, prefix_width: usize, dst: &mut BytesMut) {
    if message.is_empty() {
        return;
    }

    dst.reserve(prefix_width + message.content.len());
    put_prefix(label, prefix_width, dst);
    dst.put_slice(&message.content);

    if message.cropped > 0 {
        dst.put_slice(label.as_bytes());
        dst.put_slice(b": cropped ");
        dst.put_slice(message.cropped.to_string().as_bytes());
        dst.put_slice(b" characters\n");
    }

    if !message.terminated {
        dst.put_slice(label.as_bytes());
        dst.put_slice(b": no newline\n");
    }
}

fn put_prefix(label: &str, width: usize, dst: &mut BytesMut) {
    let start = dst.len();
    dst.put_u8(b'[');
    dst.put_slice(label.as_bytes());
    dst.put_slice(b"] ");

    let written = dst.len() - start;
    if written > width {
        dst.truncate(start + width);
    } else {
        dst.put_bytes(b' ', width - written);
    }
}

/// Configuration for framing and multiplexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum line length in bytes, terminator included. Default: 72.
    pub max_line: usize,
    /// Per-channel read buffer capacity in bytes. Default: 1024.
    pub read_capacity: usize,
    /// Width of the `[LABEL] ` prefix on every line. Default: 9.
    pub prefix_width: usize,
}

impl FrameConfig {
    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_line == 0 {
            return Err(FrameError::InvalidConfig(
                "max_line must be at least 1".to_string(),
            ));
        }
        if self.read_capacity == 0 {
            return Err(FrameError::InvalidConfig(
                "read_capacity must be at least 1".to_string(),
            ));
        }
        if self.prefix_width == 0 {
            return Err(FrameError::InvalidConfig(
                "prefix_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line: DEFAULT_MAX_LINE,
            read_capacity: DEFAULT_READ_CAPACITY,
            prefix_width: DEFAULT_PREFIX_WIDTH,
        }
    }
}
