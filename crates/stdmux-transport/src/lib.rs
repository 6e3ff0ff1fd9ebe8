//! Process pipe transport for stdmux.
//!
//! Provides the OS-facing pieces the multiplexer builds on:
//! - [`PipeReader`], a readable handle over a child's stdout/stderr pipe
//! - [`wait_readable`], a blocking readiness wait covering two handles
//! - [`SpawnedChild`], a child process with both outputs piped
//!
//! This is the lowest layer of stdmux. It is Unix-only.

pub mod error;

#[cfg(unix)]
pub mod pipe;
#[cfg(unix)]
pub mod poll;
#[cfg(unix)]
pub mod process;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use pipe::PipeReader;
#[cfg(unix)]
pub use poll::{wait_readable, Readiness};
#[cfg(unix)]
pub use process::SpawnedChild;
