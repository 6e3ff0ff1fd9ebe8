use std::io::Read;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::process::{ChildStderr, ChildStdout};

/// A readable pipe handle implementing `Read` and `AsFd`.
///
/// This is the handle type the multiplexer reads from. It usually wraps one
/// of a spawned child's output pipes, but any pollable byte source works.
pub struct PipeReader {
    inner: PipeReaderInner,
}

enum PipeReaderInner {
    Stdout(ChildStdout),
    Stderr(ChildStderr),
    Unix(UnixStream),
}

impl PipeReader {
    /// Short name of the underlying handle type, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            PipeReaderInner::Stdout(_) => "child-stdout",
            PipeReaderInner::Stderr(_) => "child-stderr",
            PipeReaderInner::Unix(_) => "unix-stream",
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            PipeReaderInner::Stdout(pipe) => pipe.read(buf),
            PipeReaderInner::Stderr(pipe) => pipe.read(buf),
            PipeReaderInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl AsFd for PipeReader {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match &self.inner {
            PipeReaderInner::Stdout(pipe) => pipe.as_fd(),
            PipeReaderInner::Stderr(pipe) => pipe.as_fd(),
            PipeReaderInner::Unix(stream) => stream.as_fd(),
        }
    }
}

impl From<ChildStdout> for PipeReader {
    fn from(pipe: ChildStdout) -> Self {
        Self {
            inner: PipeReaderInner::Stdout(pipe),
        }
    }
}

impl From<ChildStderr> for PipeReader {
    fn from(pipe: ChildStderr) -> Self {
        Self {
            inner: PipeReaderInner::Stderr(pipe),
        }
    }
}

impl From<UnixStream> for PipeReader {
    fn from(stream: UnixStream) -> Self {
        Self {
            inner: PipeReaderInner::Unix(stream),
        }
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeReader")
            .field("type", &self.kind())
            .finish()
    }
}
