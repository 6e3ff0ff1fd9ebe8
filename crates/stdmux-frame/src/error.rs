use crate::channel::Channel;
use crate::mux::MuxState;

/// Errors that abort framing or multiplexing.
///
/// Cropped lines and missing terminators are not errors; they are reported
/// as annotation lines in the output.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Reading from a channel failed.
    #[error("read failed on {channel}: {source}")]
    Read {
        channel: Channel,
        source: std::io::Error,
    },

    /// The readiness wait over both channels failed.
    #[error("wait failed: {0}")]
    Wait(#[from] stdmux_transport::TransportError),

    /// The sink rejected a write, or accepted zero bytes.
    #[error("write failed: {0}")]
    Write(std::io::Error),

    /// The frame configuration is unusable.
    #[error("invalid frame configuration: {0}")]
    InvalidConfig(String),

    /// The multiplexer already finished or failed and cannot be resumed.
    #[error("multiplexer is not running (state: {0:?})")]
    NotRunning(MuxState),
}

pub type Result<T> = std::result::Result<T, FrameError>;
