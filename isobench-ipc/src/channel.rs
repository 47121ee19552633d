//! One-Shot Message Channel
//!
//! Each worker pipe carries exactly one message: the supervisor sends a
//! [`StartMessage`] down the command pipe and the worker answers with one
//! [`ExitMessage`] on the message pipe before it exits.
//!
//! On the wire a message is its archive length as a little-endian `u32`
//! followed by the validated rkyv archive:
//! ```text
//! +----------------+------------------+
//! | length (4 LE)  | rkyv archive     |
//! +----------------+------------------+
//! ```

use crate::messages::{ExitMessage, StartMessage};
use rkyv::ser::serializers::AllocSerializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{AlignedVec, Archive, CheckBytes, Deserialize, Infallible, Serialize};
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use thiserror::Error;

/// Largest archive accepted from a peer
pub const MAX_MESSAGE_LEN: u32 = 64 * 1024 * 1024;

const LEN_PREFIX: usize = std::mem::size_of::<u32>();

/// Failure to move a message across a worker pipe
#[derive(Debug, Error)]
pub enum WireError {
    /// The pipe failed
    #[error("pipe error: {0}")]
    Io(#[from] std::io::Error),

    /// The message could not be archived
    #[error("cannot encode message: {0}")]
    Encode(String),

    /// The bytes received are not a valid message
    #[error("cannot decode message: {0}")]
    Decode(String),

    /// The announced length exceeds [`MAX_MESSAGE_LEN`]
    #[error("message of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit")]
    Oversized {
        /// Announced length
        len: u32,
    },

    /// The peer closed the pipe before sending anything
    #[error("pipe closed before a message arrived")]
    Closed,
}

/// Sending half of a worker pipe
pub struct MessageSender<W: Write> {
    inner: W,
}

impl<W: Write> MessageSender<W> {
    /// Send over `inner`
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Supervisor side: hand the worker its benchmark
    pub fn send_start(&mut self, start: &StartMessage) -> Result<(), WireError> {
        self.send(start)
    }

    /// Worker side: report the outcome
    pub fn send_exit(&mut self, exit: &ExitMessage) -> Result<(), WireError> {
        self.send(exit)
    }

    fn send<T: Serialize<AllocSerializer<1024>>>(&mut self, message: &T) -> Result<(), WireError> {
        let archive =
            rkyv::to_bytes::<_, 1024>(message).map_err(|e| WireError::Encode(e.to_string()))?;
        let len = u32::try_from(archive.len())
            .ok()
            .filter(|len| *len <= MAX_MESSAGE_LEN)
            .ok_or_else(|| {
                WireError::Encode(format!("archive of {} bytes is too large", archive.len()))
            })?;

        // One write: a reader never sees a prefix without its archive
        // unless the writer died mid-message.
        let mut packet = Vec::with_capacity(LEN_PREFIX + archive.len());
        packet.extend_from_slice(&len.to_le_bytes());
        packet.extend_from_slice(&archive);
        self.inner.write_all(&packet)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Receiving half of a worker pipe
pub struct MessageReceiver<R: Read> {
    inner: R,
}

impl<R: Read> MessageReceiver<R> {
    /// Receive from `inner`
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Worker side: wait for the benchmark to run
    pub fn recv_start(&mut self) -> Result<StartMessage, WireError> {
        self.recv()
    }

    /// Supervisor side: collect the worker's outcome
    pub fn recv_exit(&mut self) -> Result<ExitMessage, WireError> {
        self.recv()
    }

    fn recv<T>(&mut self) -> Result<T, WireError>
    where
        T: Archive,
        T::Archived: for<'a> CheckBytes<DefaultValidator<'a>> + Deserialize<T, Infallible>,
    {
        let mut prefix = [0u8; LEN_PREFIX];
        let filled = read_full(&mut self.inner, &mut prefix)?;
        if filled == 0 {
            return Err(WireError::Closed);
        }
        if filled < LEN_PREFIX {
            return Err(WireError::Decode(format!("truncated length prefix ({filled} bytes)")));
        }

        let len = u32::from_le_bytes(prefix);
        if len > MAX_MESSAGE_LEN {
            return Err(WireError::Oversized { len });
        }
        if len == 0 {
            return Err(WireError::Decode("empty archive".to_string()));
        }

        let mut archive = AlignedVec::with_capacity(len as usize);
        archive.resize(len as usize, 0);
        let got = read_full(&mut self.inner, &mut archive)?;
        if got < archive.len() {
            return Err(WireError::Decode(format!(
                "truncated archive ({got} of {len} bytes)"
            )));
        }

        rkyv::check_archived_root::<T>(&archive)
            .map_err(|e| WireError::Decode(e.to_string()))?
            .deserialize(&mut Infallible)
            .map_err(|e| WireError::Decode(format!("{e:?}")))
    }
}

/// Fill `buf` unless the stream ends first; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize, std::io::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
