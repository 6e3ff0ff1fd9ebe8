use std::ffi::OsStr;
use std::io::Write;
use std::process::ExitStatus;

use stdmux_frame::{FrameConfig, Multiplexer, MuxSummary};
use stdmux_transport::SpawnedChild;
use tracing::debug;

use crate::error::Result;

/// Result of a completed [`combine`] run.
#[derive(Debug, Clone)]
pub struct Combined {
    /// How the child exited.
    pub status: ExitStatus,
    /// Counters from the merge.
    pub summary: MuxSummary,
}

/// Run `argv` and merge its stdout and stderr into `sink` as labelled lines.
///
/// Blocks until both output pipes are closed and the child has exited. If
/// merging fails the child is killed and reaped before the error is returned.
pub fn combine<I, S, W>(argv: I, sink: W, config: &FrameConfig) -> Result<Combined>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    W: Write,
{
    config.validate()?;

    let mut child = SpawnedChild::spawn(argv)?;
    let (stdout, stderr) = child.take_pipes()?;

    let summary = {
        let mut mux = Multiplexer::with_config(stdout, stderr, sink, config)?;
        mux.run()?
    };
    debug!(pid = child.id(), ?summary, "child output merged");

    let status = child.wait()?;
    Ok(Combined { status, summary })
}
