/// Errors from running and merging a child process.
#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    /// Spawning or reaping the child failed.
    #[error("transport error: {0}")]
    Transport(#[from] stdmux_transport::TransportError),

    /// Merging the child's output failed.
    #[error("frame error: {0}")]
    Frame(#[from] stdmux_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, CombineError>;
