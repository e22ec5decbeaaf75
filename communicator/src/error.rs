use common::comm::PayloadKind;
use std::{fmt, io, path::PathBuf};

/// Any error that can end a transfer.
///
/// Only `NotReady` is ever retried, and only while connecting. Everything else
/// is reported once and ends the run.
#[derive(Debug)]
pub enum TransferError {
  /// The device does not exist yet or cannot be accessed yet, typically while
  /// the board is still being enumerated.
  NotReady(serialport::Error),

  /// The device exists but could not be opened or configured.
  Open(serialport::Error),

  /// The bootloader answered with something other than `OK`.
  Protocol {
    /// The two bytes that arrived in place of the status token.
    received: [u8; 2],
  },

  /// Reading from or writing to the device failed.
  Transport(io::Error),

  /// An image could not be loaded from disk.
  Resource {
    /// The image that failed to load.
    path: PathBuf,

    /// The underlying filesystem error.
    source: io::Error,
  },

  /// An image is too large for its length to fit the 32-bit size word.
  TooLarge {
    /// Which image is too large.
    kind: PayloadKind,

    /// Its length in bytes.
    length: u64,
  },

  /// The transfer was cancelled before the bootloader was told to go.
  Cancelled,
}

impl TransferError {
  /// Whether the session should wait and try to open the device again.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::NotReady(_))
  }
}

impl fmt::Display for TransferError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotReady(e) => write!(f, "Device is not ready: {e}"),
      Self::Open(e) => write!(f, "Unable to open device: {e}"),
      Self::Protocol { received } => write!(
        f,
        "Expected status OK from loader, received {:?}",
        String::from_utf8_lossy(received)
      ),
      Self::Transport(e) => write!(f, "Serial transport error: {e}"),
      Self::Resource { path, source } => {
        write!(f, "Unable to load {}: {source}", path.display())
      }
      Self::TooLarge { kind, length } => write!(
        f,
        "The {kind} image is {length} bytes, which does not fit a 32-bit length"
      ),
      Self::Cancelled => write!(f, "Transfer was cancelled"),
    }
  }
}

impl std::error::Error for TransferError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::NotReady(e) | Self::Open(e) => Some(e),
      Self::Transport(e) => Some(e),
      Self::Resource { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for TransferError {
  fn from(error: io::Error) -> Self {
    Self::Transport(error)
  }
}

/// A `Result` type containing a `TransferError` as its `Err` variant.
pub type TransferResult<T> = Result<T, TransferError>;
