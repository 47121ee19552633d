//! Worker Process Entry Point
//!
//! Worker side of the supervisor-worker protocol. A worker handles exactly
//! one benchmark: it reads a [`StartMessage`], rebuilds the suite tree from the
//! named definition file, runs the benchmark unit and answers with a single
//! [`ExitMessage`].
//!
//! On Unix the IPC pipes arrive on the descriptors named by `ISOBENCH_IPC_FD`
//! (normally `3,4`). Without that variable the worker falls back to
//! stdin/stdout.

use crate::measure::{Clock, MonotonicClock};
use crate::registry::Registry;
use crate::unit::BenchmarkUnit;
use isobench_ipc::{
    EXIT_COMPLETED, EXIT_FAILED, ErrorInfo, ErrorKind, ExitMessage, IPC_FD_ENV, MessageReceiver,
    MessageSender, StartMessage, WireError,
};
use std::io::{Read, Write};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// Worker transport errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Reading the start message or writing the exit message failed
    #[error("IPC error: {0}")]
    Wire(#[from] WireError),
}

/// IPC transport: either inherited fd pair or stdin/stdout fallback.
enum IpcTransport {
    #[cfg(unix)]
    Fds { read_fd: i32, write_fd: i32 },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var(IPC_FD_ENV) {
        if let Some((r, w)) = val.split_once(',') {
            if let (Ok(read_fd), Ok(write_fd)) = (r.trim().parse::<i32>(), w.trim().parse::<i32>()) {
                return IpcTransport::Fds { read_fd, write_fd };
            }
        }
        tracing::warn!(
            value = %val,
            "invalid {IPC_FD_ENV} (expected <read_fd>,<write_fd>), falling back to stdio"
        );
    }
    IpcTransport::Stdio
}

/// Run the benchmark named by `start` and build the message to send back.
///
/// `registry` must be empty; the definition file is loaded here so the
/// worker sees exactly the tree the supervisor saw.
pub fn execute<C: Clock + ?Sized>(
    clock: &C,
    registry: &mut Registry,
    start: &StartMessage,
) -> ExitMessage {
    if let Err(e) = registry.add_files([start.filename.as_str()]) {
        return ExitMessage::Failed(ErrorInfo::new(ErrorKind::Load, e.to_string()));
    }

    let Some(benchmark) = registry.get_benchmark(&start.benchmark_id) else {
        return ExitMessage::Failed(ErrorInfo::new(
            ErrorKind::NotFound,
            format!("no benchmark {} in {}", start.benchmark_id, start.filename),
        ));
    };
    let hooks = registry.hooks_for(&start.benchmark_id).unwrap_or_default();

    let mut unit = BenchmarkUnit::new(clock, benchmark, &hooks, start.options);
    match unit.run() {
        Ok(result) => ExitMessage::Completed(result),
        Err(error) => {
            tracing::debug!(benchmark = %start.benchmark_id, %error, "benchmark failed");
            ExitMessage::Failed(ErrorInfo::from(&error))
        }
    }
}

/// One-shot worker
pub struct WorkerMain {
    commands: MessageReceiver<Box<dyn Read>>,
    outcome: MessageSender<Box<dyn Write>>,
}

impl WorkerMain {
    /// Create a worker over the inherited IPC descriptors, or stdin/stdout.
    pub fn new() -> Self {
        match detect_transport() {
            #[cfg(unix)]
            IpcTransport::Fds { read_fd, write_fd } => {
                // SAFETY: the supervisor hands these descriptors to this process
                // exclusively; nothing else in the worker owns them.
                let read_file = unsafe { std::fs::File::from_raw_fd(read_fd) };
                let write_file = unsafe { std::fs::File::from_raw_fd(write_fd) };
                Self::with_io(read_file, write_file)
            }
            IpcTransport::Stdio => Self::with_io(std::io::stdin(), std::io::stdout()),
        }
    }

    /// Create a worker over arbitrary streams
    pub fn with_io(reader: impl Read + 'static, writer: impl Write + 'static) -> Self {
        Self {
            commands: MessageReceiver::new(Box::new(reader) as Box<dyn Read>),
            outcome: MessageSender::new(Box::new(writer) as Box<dyn Write>),
        }
    }

    /// Serve one benchmark and return the process exit code to use.
    pub fn run(&mut self, mut registry: Registry) -> Result<i32, WorkerError> {
        let start = self.commands.recv_start()?;
        tracing::debug!(benchmark = %start.benchmark_id, file = %start.filename, "worker started");

        let clock = MonotonicClock::new();
        let message = execute(&clock, &mut registry, &start);
        let code = match message {
            ExitMessage::Completed(_) => EXIT_COMPLETED,
            ExitMessage::Failed(_) => EXIT_FAILED,
        };

        self.outcome.send_exit(&message)?;
        Ok(code)
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
