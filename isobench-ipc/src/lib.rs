#![warn(missing_docs)]
//! isobench IPC Protocol
//!
//! Wire protocol between the supervisor and its one-shot workers.
//! Every worker receives exactly one [`StartMessage`] and answers with exactly
//! one [`ExitMessage`] before terminating, over a [`MessageSender`] /
//! [`MessageReceiver`] pair.

mod channel;
mod messages;

pub use channel::{MAX_MESSAGE_LEN, MessageReceiver, MessageSender, WireError};
pub use messages::{
    BenchResult, BenchmarkOptions, ErrorInfo, ErrorKind, ExitMessage, StartMessage,
};

/// Environment variable naming the worker's IPC file descriptors (`<read>,<write>`)
pub const IPC_FD_ENV: &str = "ISOBENCH_IPC_FD";

/// Command line flag that switches a benchmark binary into worker mode
pub const WORKER_FLAG: &str = "--isobench-worker";

/// Worker exit code after sending [`ExitMessage::Completed`]
pub const EXIT_COMPLETED: i32 = 0;

/// Worker exit code after sending [`ExitMessage::Failed`]
pub const EXIT_FAILED: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct() {
        assert_eq!(EXIT_COMPLETED, 0);
        assert_ne!(EXIT_COMPLETED, EXIT_FAILED);
    }

    #[test]
    fn test_worker_flag_is_long_option() {
        assert!(WORKER_FLAG.starts_with("--"));
    }
}
