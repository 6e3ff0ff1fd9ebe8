mod exit;
mod logging;

use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use stdmux::frame::{FrameConfig, DEFAULT_MAX_LINE, DEFAULT_READ_CAPACITY};
use tracing::info;

use crate::exit::{combine_error, exit_code, io_error, CliError, CliResult, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "stdmux",
    version,
    about = "Run a command and merge its stdout and stderr into one labelled stream"
)]
struct Cli {
    /// Maximum line length in bytes, newline included. Longer lines are cropped.
    #[arg(long, value_name = "BYTES", env = "STDMUX_MAX_LINE", default_value_t = DEFAULT_MAX_LINE)]
    max_line: usize,

    /// Per-channel read buffer size in bytes.
    #[arg(long, value_name = "BYTES", env = "STDMUX_BUFFER_SIZE", default_value_t = DEFAULT_READ_CAPACITY)]
    buffer_size: usize,

    /// Write the merged stream to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: LogLevel,

    /// Program to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

impl Cli {
    fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_line: self.max_line,
            read_capacity: self.buffer_size,
            ..FrameConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("stdmux: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: &Cli) -> CliResult<i32> {
    let config = cli.frame_config();
    config
        .validate()
        .map_err(|err| CliError::new(USAGE, err.to_string()))?;

    let combined = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("cannot create {}", path.display()), err))?;
            stdmux::combine(&cli.command, file, &config)
        }
        None => stdmux::combine(&cli.command, std::io::stdout().lock(), &config),
    }
    .map_err(|err| combine_error("run failed", err))?;

    info!(
        status = %combined.status,
        stdout_lines = combined.summary.lines[0],
        stderr_lines = combined.summary.lines[1],
        cropped = combined.summary.cropped_lines,
        "command finished"
    );

    Ok(exit_code(combined.status))
}
