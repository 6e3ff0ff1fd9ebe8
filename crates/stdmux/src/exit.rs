use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use stdmux::frame::FrameError;
use stdmux::transport::TransportError;
use stdmux::CombineError;

#[allow(dead_code)]
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const USAGE: i32 = 64;
/// The command could not be executed.
pub const EXEC_FAILED: i32 = 100;
pub const INTERNAL: i32 = 125;
/// Added to the signal number when the child was killed by a signal.
pub const SIGNAL_BASE: i32 = 128;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Map the child's exit status onto our own exit code.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => SIGNAL_BASE + signal,
        (None, None) => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => USAGE,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn combine_error(context: &str, err: CombineError) -> CliError {
    match err {
        CombineError::Transport(TransportError::Spawn { .. }) => {
            CliError::new(EXEC_FAILED, format!("{context}: {err}"))
        }
        CombineError::Transport(TransportError::EmptyCommand)
        | CombineError::Frame(FrameError::InvalidConfig(_)) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        CombineError::Frame(
            FrameError::Read { .. } | FrameError::Wait(_) | FrameError::Write(_),
        ) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
