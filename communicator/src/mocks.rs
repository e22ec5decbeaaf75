use crate::{
  cancel::CancelToken,
  device::{Connector, Device},
  error::{TransferError, TransferResult},
};
use std::{
  collections::VecDeque,
  io::{self, Write},
  sync::{Arc, Mutex},
};

/// One scripted answer to a read.
#[derive(Debug)]
pub enum Step {
  Bytes(Vec<u8>),
  Idle,
  Fail(io::ErrorKind),
}

#[derive(Default)]
struct MockState {
  script: VecDeque<Step>,
  writes: Vec<Vec<u8>>,
  bytes_read: usize,
  max_write: Option<usize>,
  fail_write: Option<usize>,
  cancel_when_drained: Option<CancelToken>,
}

/// Scripted stand-in for the bootloader end of the serial line. Clones share
/// the same script and write log, so a test can keep one while a session owns
/// the other.
#[derive(Clone, Default)]
pub struct MockDevice {
  state: Arc<Mutex<MockState>>,
}

impl MockDevice {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queues bytes to be handed out by subsequent reads. A read with a small
  /// buffer only takes part of them.
  pub fn reply(self, bytes: &[u8]) -> Self {
    self.push(Step::Bytes(bytes.to_vec()))
  }

  /// Queues `count` status tokens, each as its own read.
  pub fn acks(mut self, count: usize) -> Self {
    for _ in 0..count {
      self = self.reply(b"OK");
    }

    self
  }

  /// Queues a read that finds no data.
  pub fn idle(self) -> Self {
    self.push(Step::Idle)
  }

  /// Queues a failing read.
  pub fn fail_read(self, kind: io::ErrorKind) -> Self {
    self.push(Step::Fail(kind))
  }

  /// Caps how many bytes a single write accepts.
  pub fn with_max_write(self, max: usize) -> Self {
    self.state.lock().unwrap().max_write = Some(max);
    self
  }

  /// Makes the write with the given zero-based index fail.
  pub fn fail_write_at(self, index: usize) -> Self {
    self.state.lock().unwrap().fail_write = Some(index);
    self
  }

  /// Trips `token` the first time a read finds the script empty.
  pub fn cancel_when_drained(self, token: CancelToken) -> Self {
    self.state.lock().unwrap().cancel_when_drained = Some(token);
    self
  }

  pub fn writes(&self) -> Vec<Vec<u8>> {
    self.state.lock().unwrap().writes.clone()
  }

  pub fn bytes_read(&self) -> usize {
    self.state.lock().unwrap().bytes_read
  }

  /// Scripted bytes which no read has consumed yet.
  pub fn unread(&self) -> Vec<u8> {
    self
      .state
      .lock()
      .unwrap()
      .script
      .iter()
      .flat_map(|step| match step {
        Step::Bytes(bytes) => bytes.clone(),
        _ => Vec::new(),
      })
      .collect()
  }

  fn push(self, step: Step) -> Self {
    self.state.lock().unwrap().script.push_back(step);
    self
  }
}

impl Device for MockDevice {
  fn read_bytes(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
    let mut state = self.state.lock().unwrap();

    match state.script.pop_front() {
      Some(Step::Bytes(bytes)) => {
        let count = bytes.len().min(buffer.len());
        buffer[..count].copy_from_slice(&bytes[..count]);

        if count < bytes.len() {
          state.script.push_front(Step::Bytes(bytes[count..].to_vec()));
        }

        state.bytes_read += count;
        Ok(count)
      }
      Some(Step::Idle) => Ok(0),
      Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
      None => {
        if let Some(token) = &state.cancel_when_drained {
          token.cancel();
        }

        Ok(0)
      }
    }
  }

  fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
    let mut state = self.state.lock().unwrap();

    if state.fail_write == Some(state.writes.len()) {
      return Err(io::Error::from(io::ErrorKind::BrokenPipe));
    }

    let count = state.max_write.map_or(bytes.len(), |max| max.min(bytes.len()));
    state.writes.push(bytes[..count].to_vec());
    Ok(count)
  }
}

/// Hands out scripted open results in order.
pub struct MockConnector {
  outcomes: VecDeque<TransferResult<MockDevice>>,
  pub attempts: usize,
}

impl MockConnector {
  pub fn new(outcomes: Vec<TransferResult<MockDevice>>) -> Self {
    MockConnector {
      outcomes: outcomes.into(),
      attempts: 0,
    }
  }
}

impl Connector for MockConnector {
  type Device = MockDevice;

  fn open(&mut self) -> TransferResult<MockDevice> {
    self.attempts += 1;
    self.outcomes.pop_front().unwrap_or_else(|| Err(fatal_open()))
  }
}

pub fn not_ready() -> TransferError {
  TransferError::NotReady(serialport::Error::new(
    serialport::ErrorKind::NoDevice,
    "no such device",
  ))
}

pub fn fatal_open() -> TransferError {
  TransferError::Open(serialport::Error::new(
    serialport::ErrorKind::Unknown,
    "not a tty",
  ))
}

/// Echo sink whose contents stay readable after a session takes ownership.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
  pub fn contents(&self) -> Vec<u8> {
    self.0.lock().unwrap().clone()
  }
}

impl Write for SharedBuffer {
  fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(bytes);
    Ok(bytes.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Echo sink which rejects every write, like a closed stdout.
pub struct BrokenSink;

impl Write for BrokenSink {
  fn write(&mut self, _: &[u8]) -> io::Result<usize> {
    Err(io::Error::from(io::ErrorKind::BrokenPipe))
  }

  fn flush(&mut self) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::BrokenPipe))
  }
}
