use std::ffi::OsString;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The readiness wait failed.
    #[error("readiness wait failed: {0}")]
    Poll(std::io::Error),

    /// The child program could not be started.
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: OsString,
        source: std::io::Error,
    },

    /// No program was given to spawn.
    #[error("empty command line")]
    EmptyCommand,

    /// A requested output pipe was not available on the child.
    #[error("child {0} pipe unavailable")]
    MissingPipe(&'static str),

    /// Waiting for the child to exit failed.
    #[error("failed to reap child: {0}")]
    Wait(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
