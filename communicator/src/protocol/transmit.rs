use super::handshake;
use crate::{
  cancel::CancelToken,
  device::Device,
  error::{TransferError, TransferResult},
};
use std::io;

/// Totals of one completed payload body.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferReport {
  /// Number of chunks written, each acknowledged separately.
  pub chunks: usize,

  /// Number of payload bytes written.
  pub bytes: usize,
}

/// Accounting for a body while it is being streamed.
#[derive(Debug)]
struct Progress {
  remaining: usize,
  written: usize,
  chunk: usize,
}

impl Progress {
  fn new(length: usize) -> Self {
    Progress {
      remaining: length,
      written: 0,
      chunk: 0,
    }
  }

  fn next_chunk(&self, chunk_size: usize) -> (usize, usize) {
    (self.written, self.written + self.remaining.min(chunk_size))
  }

  fn advance(&mut self, written: usize) {
    self.remaining -= written;
    self.written += written;
    self.chunk += 1;
  }

  fn report(&self) -> TransferReport {
    TransferReport {
      chunks: self.chunk,
      bytes: self.written,
    }
  }
}

/// Streams `data` in chunks of at most `chunk_size` bytes, waiting for the
/// bootloader to acknowledge each chunk before writing the next.
///
/// If the device accepts only part of a chunk, the next chunk starts right
/// after the last byte it took. A write that fails, or accepts nothing, ends
/// the transfer.
pub fn transmit<D: Device + ?Sized>(
  device: &mut D,
  data: &[u8],
  chunk_size: usize,
  cancel: &CancelToken,
) -> TransferResult<TransferReport> {
  let mut progress = Progress::new(data.len());

  while progress.remaining > 0 {
    if cancel.is_cancelled() {
      return Err(TransferError::Cancelled);
    }

    let (start, end) = progress.next_chunk(chunk_size);
    let written = device.write_bytes(&data[start..end])?;

    if written == 0 {
      return Err(TransferError::Transport(io::Error::new(
        io::ErrorKind::WriteZero,
        format!("device accepted no bytes of chunk {}", progress.chunk),
      )));
    }

    progress.advance(written);
    handshake::await_status(device, cancel)?;
  }

  Ok(progress.report())
}
