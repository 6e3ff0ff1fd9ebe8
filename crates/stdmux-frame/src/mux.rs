use std::io::{Read, Write};
use std::os::fd::AsFd;

use tracing::{debug, trace};

use crate::channel::Channel;
use crate::codec::{FrameConfig, Message};
use crate::error::{FrameError, Result};
use crate::framer::LineFramer;
use crate::reader::ChannelPair;
use crate::writer::FrameWriter;

/// Lifecycle of a [`Multiplexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
    /// Created, or currently merging.
    Running,
    /// Both channels were drained.
    Done,
    /// A read, wait or write failed. Cannot be resumed.
    Failed,
}

/// Counters collected while merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuxSummary {
    /// Lines emitted per channel, indexed by [`Channel::index`].
    pub lines: [usize; 2],
    /// Lines that were cropped.
    pub cropped_lines: usize,
    /// Lines forced out by channel closure without a terminator.
    pub unterminated_lines: usize,
    /// Total bytes written to the sink.
    pub bytes_written: usize,
}

impl MuxSummary {
    fn record(&mut self, channel: Channel, message: &Message, written: usize) {
        self.lines[channel.index()] += 1;
        if message.cropped > 0 {
            self.cropped_lines += 1;
        }
        if !message.terminated {
            self.unterminated_lines += 1;
        }
        self.bytes_written += written;
    }
}

/// Merges two channels into one labelled sink.
///
/// Each iteration services the primary channel, then the secondary one,
/// framing at most one line from each. Lines from one channel keep their
/// source order. Merging ends once both channels are exhausted and their
/// buffers are empty.
pub struct Multiplexer<R, W> {
    channels: ChannelPair<R>,
    framer: LineFramer,
    writer: FrameWriter<W>,
    state: MuxState,
    summary: MuxSummary,
}

impl<R: Read + AsFd, W: Write> Multiplexer<R, W> {
    /// Create a multiplexer with the default configuration.
    pub fn new(primary: R, secondary: R, sink: W) -> Self {
        Self::build(primary, secondary, sink, &FrameConfig::default())
    }

    /// Create a multiplexer with an explicit configuration.
    pub fn with_config(primary: R, secondary: R, sink: W, config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(primary, secondary, sink, config))
    }

    fn build(primary: R, secondary: R, sink: W, config: &FrameConfig) -> Self {
        Self {
            channels: ChannelPair::new(primary, secondary, config.read_capacity),
            framer: LineFramer::new(config.max_line),
            writer: FrameWriter::with_config(sink, config),
            state: MuxState::Running,
            summary: MuxSummary::default(),
        }
    }

    /// Merge until both channels are drained (blocking).
    ///
    /// Any read, wait or write failure moves the multiplexer to
    /// [`MuxState::Failed`] and is returned. A finished or failed multiplexer
    /// returns [`FrameError::NotRunning`].
    pub fn run(&mut self) -> Result<MuxSummary> {
        if self.state != MuxState::Running {
            return Err(FrameError::NotRunning(self.state));
        }

        match self.drive() {
            Ok(()) => {
                self.state = MuxState::Done;
                debug!(summary = ?self.summary, "both channels drained");
                Ok(self.summary.clone())
            }
            Err(err) => {
                self.state = MuxState::Failed;
                debug!(%err, "multiplexer failed");
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> Result<()> {
        loop {
            let mut produced = false;
            for channel in Channel::SERVICE_ORDER {
                let message = self.framer.next_message(&mut self.channels, channel)?;
                if message.is_empty() {
                    continue;
                }
                produced = true;
                let written = self.writer.write_message(channel.label(), &message)?;
                trace!(%channel, written, "frame written");
                self.summary.record(channel, &message, written);
            }

            if !produced && self.channels.is_drained() {
                return Ok(());
            }
        }
    }
}

impl<R, W> Multiplexer<R, W> {
    /// Current lifecycle state.
    pub fn state(&self) -> MuxState {
        self.state
    }

    /// Counters collected so far.
    pub fn summary(&self) -> &MuxSummary {
        &self.summary
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &W {
        self.writer.get_ref()
    }

    /// Consume the multiplexer and return the sink.
    pub fn into_sink(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Write};
    use std::os::fd::BorrowedFd;
    use std::os::unix::net::UnixStream;
    use std::time::Duration;

    use stdmux_transport::{Readiness, TransportError};

    use super::*;

    fn channels() -> ((UnixStream, UnixStream), (UnixStream, UnixStream)) {
        (UnixStream::pair().unwrap(), UnixStream::pair().unwrap())
    }

    fn run_to_string(out: &[u8], err: &[u8]) -> String {
        let ((mut out_tx, out_rx), (mut err_tx, err_rx)) = channels();
        out_tx.write_all(out).unwrap();
        err_tx.write_all(err).unwrap();
        drop(out_tx);
        drop(err_tx);

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        mux.run().unwrap();
        assert_eq!(mux.state(), MuxState::Done);
        String::from_utf8(mux.into_sink()).unwrap()
    }

    #[test]
    fn hello_world_scenario() {
        let out = run_to_string(b"hello\n", b"world\n");
        assert_eq!(out, "[STDOUT] hello\n[STDERR] world\n");
    }

    #[test]
    fn no_output_is_empty_success() {
        let out = run_to_string(b"", b"");
        assert!(out.is_empty());
    }

    #[test]
    fn unterminated_80_bytes_scenario() {
        let out = run_to_string(&[b'a'; 80], b"");
        let expected = format!(
            "[STDOUT] {}\nSTDOUT: cropped 9 characters\nSTDOUT: no newline\n",
            "a".repeat(71)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn long_terminated_line_is_cropped() {
        let mut line = vec![b'e'; 85];
        line.push(b'\n');
        let out = run_to_string(b"", &line);
        let expected = format!(
            "[STDERR] {}\nSTDERR: cropped 14 characters\n",
            "e".repeat(71)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn lines_alternate_one_per_channel_per_iteration() {
        let out = run_to_string(b"o1\no2\no3\n", b"e1\ne2\n");
        assert_eq!(
            out,
            "[STDOUT] o1\n[STDERR] e1\n[STDOUT] o2\n[STDERR] e2\n[STDOUT] o3\n"
        );
    }

    #[test]
    fn secondary_drains_after_primary_closes() {
        let out = run_to_string(b"", b"a\nb\nc");
        assert_eq!(
            out,
            "[STDERR] a\n[STDERR] b\n[STDERR] c\nSTDERR: no newline\n"
        );
    }

    #[test]
    fn primary_is_awaited_before_secondary() {
        let ((out_tx, out_rx), (mut err_tx, err_rx)) = channels();
        err_tx.write_all(b"err first\n").unwrap();
        drop(err_tx);

        let writer = std::thread::spawn(move || {
            let mut out_tx = out_tx;
            std::thread::sleep(Duration::from_millis(50));
            out_tx.write_all(b"out later\n").unwrap();
        });

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        mux.run().unwrap();
        writer.join().unwrap();

        let out = String::from_utf8(mux.into_sink()).unwrap();
        assert_eq!(out, "[STDOUT] out later\n[STDERR] err first\n");
    }

    #[test]
    fn per_channel_order_is_preserved_under_interleaving() {
        let ((mut out_tx, out_rx), (mut err_tx, err_rx)) = channels();

        let producer = std::thread::spawn(move || {
            for i in 0..200 {
                if i % 3 == 0 {
                    writeln!(err_tx, "err {i}").unwrap();
                } else {
                    writeln!(out_tx, "out {i}").unwrap();
                }
                if i % 17 == 0 {
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
        });

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        let summary = mux.run().unwrap();
        producer.join().unwrap();

        let out = String::from_utf8(mux.into_sink()).unwrap();
        let stdout: Vec<&str> = out
            .lines()
            .filter_map(|l| l.strip_prefix("[STDOUT] "))
            .collect();
        let stderr: Vec<&str> = out
            .lines()
            .filter_map(|l| l.strip_prefix("[STDERR] "))
            .collect();

        let expected_out: Vec<String> = (0..200)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("out {i}"))
            .collect();
        let expected_err: Vec<String> = (0..200)
            .filter(|i| i % 3 == 0)
            .map(|i| format!("err {i}"))
            .collect();
        assert_eq!(stdout, expected_out);
        assert_eq!(stderr, expected_err);
        assert_eq!(summary.lines, [expected_out.len(), expected_err.len()]);
    }

    #[test]
    fn summary_counts_annotations() {
        let ((mut out_tx, out_rx), (mut err_tx, err_rx)) = channels();
        out_tx.write_all(&[b'x'; 100]).unwrap();
        out_tx.write_all(b"\nshort\n").unwrap();
        err_tx.write_all(b"tail").unwrap();
        drop(out_tx);
        drop(err_tx);

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        let summary = mux.run().unwrap();

        assert_eq!(summary.lines, [2, 1]);
        assert_eq!(summary.cropped_lines, 1);
        assert_eq!(summary.unterminated_lines, 1);
        assert_eq!(summary.bytes_written, mux.sink().len());
    }

    #[test]
    fn custom_config_limits_line_length() {
        let ((mut out_tx, out_rx), (err_tx, err_rx)) = channels();
        out_tx.write_all(b"0123456789\n").unwrap();
        drop(out_tx);
        drop(err_tx);

        let cfg = FrameConfig {
            max_line: 5,
            read_capacity: 3,
            ..FrameConfig::default()
        };
        let mut mux = Multiplexer::with_config(out_rx, err_rx, Vec::new(), &cfg).unwrap();
        mux.run().unwrap();

        let out = String::from_utf8(mux.into_sink()).unwrap();
        assert_eq!(out, "[STDOUT] 0123\nSTDOUT: cropped 6 characters\n");
    }

    #[test]
    fn invalid_config_rejected() {
        let ((_out_tx, out_rx), (_err_tx, err_rx)) = channels();
        let cfg = FrameConfig {
            max_line: 0,
            ..FrameConfig::default()
        };
        let result = Multiplexer::with_config(out_rx, err_rx, Vec::new(), &cfg);
        assert!(matches!(result, Err(FrameError::InvalidConfig(_))));
    }

    #[test]
    fn finished_multiplexer_cannot_rerun() {
        let ((out_tx, out_rx), (err_tx, err_rx)) = channels();
        drop(out_tx);
        drop(err_tx);

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        mux.run().unwrap();
        let err = mux.run().unwrap_err();
        assert!(matches!(err, FrameError::NotRunning(MuxState::Done)));
    }

    #[test]
    fn read_failure_fails_the_multiplexer() {
        let (mut out_tx, out_rx) = UnixStream::pair().unwrap();
        let (_err_tx, err_rx) = UnixStream::pair().unwrap();
        out_tx.write_all(b"partial").unwrap();

        let primary = FlakyStream {
            stream: out_rx,
            fail_after: 1,
        };
        let secondary = FlakyStream {
            stream: err_rx,
            fail_after: usize::MAX,
        };
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            out_tx.write_all(b" more").unwrap();
        });

        let mut mux = Multiplexer::new(primary, secondary, Vec::new());
        let err = mux.run().unwrap_err();
        writer.join().unwrap();

        assert!(matches!(
            err,
            FrameError::Read {
                channel: Channel::Primary,
                ..
            }
        ));
        assert_eq!(mux.state(), MuxState::Failed);
        assert!(mux.sink().is_empty());
        assert!(matches!(
            mux.run().unwrap_err(),
            FrameError::NotRunning(MuxState::Failed)
        ));
    }

    #[test]
    fn write_failure_fails_the_multiplexer() {
        let ((mut out_tx, out_rx), (err_tx, err_rx)) = channels();
        out_tx.write_all(b"line\n").unwrap();
        drop(out_tx);
        drop(err_tx);

        let mut mux = Multiplexer::new(out_rx, err_rx, ClosedSink);
        let err = mux.run().unwrap_err();

        assert!(matches!(err, FrameError::Write(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(mux.state(), MuxState::Failed);
    }

    #[test]
    fn wait_failure_fails_the_multiplexer() {
        let ((_out_tx, out_rx), (_err_tx, err_rx)) = channels();

        let mut mux = Multiplexer::new(out_rx, err_rx, Vec::new());
        mux.channels.set_wait(failing_wait);
        let err = mux.run().unwrap_err();

        assert!(matches!(err, FrameError::Wait(_)));
        assert_eq!(mux.state(), MuxState::Failed);
        assert!(mux.sink().is_empty());
    }

    fn failing_wait(
        _handles: [Option<BorrowedFd<'_>>; 2],
    ) -> stdmux_transport::Result<[Readiness; 2]> {
        Err(TransportError::Poll(std::io::Error::other("poll unavailable")))
    }

    /// Socket-backed reader that errors after `fail_after` successful reads.
    struct FlakyStream {
        stream: UnixStream,
        fail_after: usize,
    }

    impl Read for FlakyStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.fail_after == 0 {
                return Err(std::io::Error::other("device gone"));
            }
            self.fail_after -= 1;
            self.stream.read(buf)
        }
    }

    impl AsFd for FlakyStream {
        fn as_fd(&self) -> BorrowedFd<'_> {
            self.stream.as_fd()
        }
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
