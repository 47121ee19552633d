//! Supervisor Process
//!
//! Runs every benchmark in its own freshly spawned worker process. The worker
//! receives one `StartMessage` on fd 3 and answers with one `ExitMessage` on
//! fd 4; the supervisor then reaps it and classifies the outcome.

use isobench_ipc::{
    BenchResult, ErrorInfo, ExitMessage, IPC_FD_ENV, MessageReceiver, MessageSender, StartMessage,
    WORKER_FLAG, WireError,
};
use rayon::ThreadPoolBuilder;
use std::ffi::{OsStr, OsString};
use std::os::unix::io::{FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Time a worker gets to exit after SIGTERM before it is killed
pub const TERM_GRACE: Duration = Duration::from_millis(500);

/// Longest single poll; bounds how late a deadline is noticed
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Why a benchmark produced no result
#[derive(Debug, Error)]
pub enum IsolationError {
    /// The worker process could not be started
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The benchmark ran and reported a failure
    #[error("{0}")]
    Benchmark(ErrorInfo),

    /// The worker died without reporting
    #[error("worker terminated unexpectedly ({0})")]
    WorkerCrashed(String),

    /// The worker broke the protocol
    #[error("worker protocol error: {0}")]
    Protocol(String),

    /// The worker exceeded its time limit and was killed
    #[error("worker for {benchmark_id} timed out after {after:?}")]
    Timeout {
        /// Benchmark the worker was running
        benchmark_id: String,
        /// Configured limit
        after: Duration,
    },

    /// The worker pool could not be built
    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

/// Program and arguments used to start a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    /// Run `program` with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// The running executable in worker mode
    pub fn current_exe() -> Result<Self, std::io::Error> {
        Ok(Self::new(std::env::current_exe()?).arg(WORKER_FLAG))
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Program to execute
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

/// Result of polling for data
#[derive(Debug)]
enum PollResult {
    DataAvailable,
    Timeout,
    PipeClosed,
    Error(std::io::Error),
}

/// Wait for data to be available on a file descriptor with timeout
fn wait_for_data(fd: RawFd, timeout: Duration) -> PollResult {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };

    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    let result = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };

    if result < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            PollResult::Timeout
        } else {
            PollResult::Error(err)
        }
    } else if result == 0 {
        PollResult::Timeout
    } else if pollfd.revents & libc::POLLIN != 0 {
        // Data first: a closing pipe may still hold the exit message
        PollResult::DataAvailable
    } else if pollfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        PollResult::PipeClosed
    } else {
        PollResult::Timeout
    }
}

/// Create a close-on-exec pipe pair, returning (read_fd, write_fd).
#[cfg(target_os = "linux")]
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok((fds[0], fds[1]))
}

/// Create a close-on-exec pipe pair, returning (read_fd, write_fd).
#[cfg(not(target_os = "linux"))]
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    for &fd in &fds {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
    Ok((fds[0], fds[1]))
}

/// Close a raw file descriptor.
fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// Send a signal to a process. Returns `Err` if the signal could not be delivered.
fn send_signal(pid: u32, signal: libc::c_int) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// One worker process, used for exactly one benchmark
pub struct WorkerHandle {
    child: Child,
    exits: MessageReceiver<std::fs::File>,
    starts: Option<MessageSender<std::fs::File>>,
    msg_read_fd: RawFd,
    timeout: Option<Duration>,
}

impl WorkerHandle {
    /// Spawn a worker with the command pipe on fd 3 and the message pipe on fd 4.
    pub fn spawn(command: &WorkerCommand, timeout: Option<Duration>) -> Result<Self, IsolationError> {
        // cmd_pipe: supervisor writes the start message → worker reads from fd 3
        let (cmd_read, cmd_write) = create_pipe()?;
        // msg_pipe: worker writes its exit message to fd 4 → supervisor reads
        let (msg_read, msg_write) = match create_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                return Err(IsolationError::Spawn(e));
            }
        };

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .env(IPC_FD_ENV, "3,4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // In the child: move both ends above the target slots first so that
        // neither dup2 can clobber the other, then install them as 3 and 4.
        // Every pipe descriptor is close-on-exec; the dup2 copies are not.
        unsafe {
            cmd.pre_exec(move || {
                #[cfg(target_os = "linux")]
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) != 0 {
                    return Err(std::io::Error::last_os_error());
                }

                let read_high = libc::fcntl(cmd_read, libc::F_DUPFD_CLOEXEC, 10);
                let write_high = libc::fcntl(msg_write, libc::F_DUPFD_CLOEXEC, 10);
                if read_high < 0 || write_high < 0 {
                    return Err(std::io::Error::last_os_error());
                }
                if libc::dup2(read_high, 3) < 0 || libc::dup2(write_high, 4) < 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                close_fd(msg_read);
                close_fd(msg_write);
                return Err(IsolationError::Spawn(e));
            }
        };
        tracing::debug!(pid = child.id(), program = %command.program.display(), "worker spawned");

        // Close the child-side ends in the parent
        close_fd(cmd_read);
        close_fd(msg_write);

        // Wrap parent-side ends in Files
        let writer_file = unsafe { std::fs::File::from_raw_fd(cmd_write) };
        let reader_file = unsafe { std::fs::File::from_raw_fd(msg_read) };

        Ok(Self {
            child,
            exits: MessageReceiver::new(reader_file),
            starts: Some(MessageSender::new(writer_file)),
            msg_read_fd: msg_read,
            timeout,
        })
    }

    /// Process id of the worker
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send the start message, wait for the exit message and the process exit,
    /// and classify the outcome.
    pub fn run(mut self, start: &StartMessage) -> Result<BenchResult, IsolationError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);

        // Closing our end afterwards lets the worker see EOF if it reads again.
        if let Some(mut starts) = self.starts.take() {
            if let Err(e) = starts.send_start(start) {
                // A worker that died on startup closes its end; the exit
                // status below tells what happened.
                tracing::debug!(benchmark = %start.benchmark_id, error = %e, "start message not delivered");
            }
        }

        let message = match self.receive(deadline) {
            Ok(message) => message,
            Err(Received::TimedOut) => return Err(self.terminate(start)),
            Err(Received::Malformed(reason)) => {
                self.kill();
                return Err(IsolationError::WorkerCrashed(format!("malformed message: {reason}")));
            }
        };

        let status = match self.wait_exit(deadline)? {
            Some(status) => status,
            None => return Err(self.terminate(start)),
        };

        classify(message, status)
    }

    /// Read the single exit message. `Ok(None)` means the worker closed its
    /// end without sending one.
    fn receive(&mut self, deadline: Option<Instant>) -> Result<Option<ExitMessage>, Received> {
        loop {
            let slice = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(Received::TimedOut);
                    }
                    remaining.min(POLL_SLICE)
                }
                None => POLL_SLICE,
            };

            match wait_for_data(self.msg_read_fd, slice) {
                PollResult::DataAvailable => {}
                PollResult::Timeout => continue,
                PollResult::PipeClosed => return Ok(None),
                PollResult::Error(e) => return Err(Received::Malformed(e.to_string())),
            }

            // Blocking read: poll above confirmed data is available
            return match self.exits.recv_exit() {
                Ok(message) => Ok(Some(message)),
                Err(WireError::Closed) => Ok(None),
                Err(e) => Err(Received::Malformed(e.to_string())),
            };
        }
    }

    /// Wait for the process to exit. `Ok(None)` when the deadline passes first.
    fn wait_exit(&mut self, deadline: Option<Instant>) -> Result<Option<ExitStatus>, IsolationError> {
        let Some(deadline) = deadline else {
            return Ok(Some(self.child.wait()?));
        };
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// SIGTERM, a short grace period, then SIGKILL.
    fn terminate(&mut self, start: &StartMessage) -> IsolationError {
        tracing::warn!(benchmark = %start.benchmark_id, pid = self.pid(), "worker timed out, terminating");
        let _ = send_signal(self.child.id(), libc::SIGTERM);

        let grace = Instant::now() + TERM_GRACE;
        while Instant::now() < grace {
            if !self.is_alive() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.kill();

        IsolationError::Timeout {
            benchmark_id: start.benchmark_id.clone(),
            after: self.timeout.unwrap_or_default(),
        }
    }

    /// Check if worker process is still running
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the worker process forcefully and reap it
    fn kill(&mut self) {
        if self.is_alive() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            // Graceful: SIGTERM first, brief wait, then SIGKILL
            let _ = send_signal(self.child.id(), libc::SIGTERM);
            std::thread::sleep(Duration::from_millis(50));
            if self.is_alive() {
                let _ = self.child.kill();
            }
            let _ = self.child.wait();
        }
    }
}

enum Received {
    TimedOut,
    Malformed(String),
}

fn classify(message: Option<ExitMessage>, status: ExitStatus) -> Result<BenchResult, IsolationError> {
    match message {
        Some(ExitMessage::Completed(result)) if status.success() => Ok(result),
        Some(ExitMessage::Completed(_)) => Err(IsolationError::WorkerCrashed(format!(
            "{status} after reporting a result"
        ))),
        Some(ExitMessage::Failed(error)) => Err(IsolationError::Benchmark(error)),
        None if status.success() => Err(IsolationError::Protocol(
            "worker exited without reporting a result".to_string(),
        )),
        None => Err(IsolationError::WorkerCrashed(status.to_string())),
    }
}

/// Terminal outcome of one benchmark
#[derive(Debug)]
pub struct JobOutcome {
    /// Benchmark id
    pub benchmark_id: String,
    /// Result, or why there is none
    pub outcome: Result<BenchResult, IsolationError>,
}

/// Supervisor that distributes benchmarks over a bounded pool of workers
#[derive(Debug, Clone)]
pub struct Supervisor {
    command: WorkerCommand,
    timeout: Option<Duration>,
    num_workers: usize,
}

impl Supervisor {
    /// Create a new supervisor
    pub fn new(command: WorkerCommand, timeout: Option<Duration>, num_workers: usize) -> Self {
        Self {
            command,
            timeout,
            num_workers: num_workers.max(1),
        }
    }

    /// Maximum number of concurrent workers
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Run a single benchmark in a fresh worker process
    pub fn run_isolated(&self, start: &StartMessage) -> Result<BenchResult, IsolationError> {
        let worker = WorkerHandle::spawn(&self.command, self.timeout)?;
        let outcome = worker.run(start);
        if let Err(e) = &outcome {
            tracing::debug!(benchmark = %start.benchmark_id, error = %e, "benchmark failed");
        }
        outcome
    }

    /// Run every job, each in its own worker, at most `num_workers` at a time.
    ///
    /// `on_outcome` is called on the calling thread, in completion order, as
    /// soon as each job finishes.
    pub fn run_all(
        &self,
        jobs: Vec<StartMessage>,
        mut on_outcome: impl FnMut(JobOutcome),
    ) -> Result<(), IsolationError> {
        if jobs.is_empty() {
            return Ok(());
        }

        if self.num_workers == 1 || jobs.len() == 1 {
            for start in jobs {
                let outcome = self.run_isolated(&start);
                on_outcome(JobOutcome {
                    benchmark_id: start.benchmark_id,
                    outcome,
                });
            }
            return Ok(());
        }

        let worker_count = self.num_workers.min(jobs.len());
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("isobench-worker-{i}"))
            .build()
            .map_err(|e| IsolationError::Pool(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<JobOutcome>();
        pool.in_place_scope(|scope| {
            for start in jobs {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = self.run_isolated(&start);
                    let _ = tx.send(JobOutcome {
                        benchmark_id: start.benchmark_id,
                        outcome,
                    });
                });
            }
            drop(tx);

            for outcome in rx {
                on_outcome(outcome);
            }
        });
        Ok(())
    }
}
