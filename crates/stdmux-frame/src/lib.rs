//! Line framing with two-channel multiplexing for captured process output.
//!
//! This is the core of stdmux. Bytes from a child's stdout and stderr are
//! split into lines, each line is bounded to a maximum length and written to a
//! single sink with its channel label:
//!
//! ```text
//! [STDOUT] hello
//! [STDERR] this line is to
//! STDERR: cropped 6 characters
//! [STDOUT] partial
//! STDOUT: no newline
//! ```
//!
//! (shown with a maximum line length of 16 bytes)
//!
//! Memory use is bounded regardless of line length.

pub mod channel;
pub mod codec;
pub mod error;
pub mod framer;
pub mod mux;
pub mod reader;
pub mod writer;

pub use channel::Channel;
pub use codec::{
    encode_frame, FrameConfig, Message, DEFAULT_MAX_LINE, DEFAULT_PREFIX_WIDTH,
    DEFAULT_READ_CAPACITY, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use framer::LineFramer;
pub use mux::{Multiplexer, MuxState, MuxSummary};
pub use reader::{Arrival, ChannelPair, ChannelReader};
pub use writer::FrameWriter;
