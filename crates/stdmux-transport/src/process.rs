use std::ffi::{OsStr, OsString};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::pipe::PipeReader;

/// A child process whose stdout and stderr are captured through pipes.
///
/// The child is reaped by [`SpawnedChild::wait`]. If the value is dropped
/// before that (for example on an error path), the child is killed and reaped
/// so no zombie is left behind.
pub struct SpawnedChild {
    child: Child,
    program: OsString,
    reaped: bool,
}

impl SpawnedChild {
    /// Start `argv[0]` with the remaining elements as arguments.
    ///
    /// stdout and stderr are piped; stdin is inherited. The program is looked
    /// up on `PATH` like `execvp`.
    pub fn spawn<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut argv = argv.into_iter();
        let program = argv
            .next()
            .map(|p| p.as_ref().to_os_string())
            .ok_or(TransportError::EmptyCommand)?;

        let child = Command::new(&program)
            .args(argv)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                program: program.clone(),
                source,
            })?;

        debug!(?program, pid = child.id(), "spawned child");

        Ok(Self {
            child,
            program,
            reaped: false,
        })
    }

    /// Take the child's `(stdout, stderr)` pipe readers.
    ///
    /// Fails with [`TransportError::MissingPipe`] if called twice.
    pub fn take_pipes(&mut self) -> Result<(PipeReader, PipeReader)> {
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or(TransportError::MissingPipe("stdout"))?;
        let stderr = self
            .child
            .stderr
            .take()
            .ok_or(TransportError::MissingPipe("stderr"))?;
        Ok((stdout.into(), stderr.into()))
    }

    /// OS process id of the child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// The program name the child was started with.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Wait for the child to exit and return its status.
    pub fn wait(mut self) -> Result<ExitStatus> {
        let status = self.child.wait().map_err(TransportError::Wait)?;
        self.reaped = true;
        debug!(pid = self.child.id(), ?status, "child exited");
        Ok(status)
    }
}

impl Drop for SpawnedChild {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        let pid = self.child.id();
        warn!(pid, program = ?self.program, "killing un-reaped child");
        if let Err(err) = self.child.kill() {
            debug!(pid, %err, "kill failed (child likely already exited)");
        }
        let _ = self.child.wait();
    }
}

impl std::fmt::Debug for SpawnedChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedChild")
            .field("pid", &self.child.id())
            .field("program", &self.program)
            .field("reaped", &self.reaped)
            .finish()
    }
}
