//! Run a command and merge its stdout and stderr into one labelled stream.
//!
//! ```no_run
//! use stdmux::frame::FrameConfig;
//!
//! let mut out = Vec::new();
//! let combined = stdmux::combine(["make", "test"], &mut out, &FrameConfig::default())?;
//! println!("exit: {}", combined.status);
//! # Ok::<(), stdmux::CombineError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`transport`]: pipe handles, readiness wait, child spawning
//! - [`frame`]: line framing and two-channel multiplexing

mod combine;
mod error;

pub use combine::{combine, Combined};
pub use error::{CombineError, Result};

/// Re-export transport types.
pub mod transport {
    pub use stdmux_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use stdmux_frame::*;
}
