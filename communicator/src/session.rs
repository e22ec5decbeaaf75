use crate::{
  cancel::CancelToken,
  device::{self, Connector},
  error::{TransferError, TransferResult},
  payload::Payload,
  protocol,
};
use common::comm::{PayloadKind, CHUNK_SIZE, GO_COMMAND};
use jeflog::{pass, task, warn};
use std::{
  fmt,
  io::{self, Write},
  thread,
  time::Duration,
};

/// Tunables of a session which do not depend on the device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionSettings {
  /// Largest number of payload bytes written per acknowledged chunk.
  pub chunk_size: usize,

  /// Pause between attempts to open a device which is not ready yet.
  pub retry_delay: Duration,
}

impl Default for SessionSettings {
  fn default() -> Self {
    SessionSettings {
      chunk_size: CHUNK_SIZE,
      retry_delay: Duration::from_secs(1),
    }
  }
}

/// The step a session is at. Every state after `Connecting` owns the open
/// device, which is closed as soon as the state holding it is dropped.
pub enum SessionState<D> {
  /// Nothing has been attempted yet.
  Disconnected,

  /// Trying to open the device, possibly again after a pause.
  Connecting,

  /// Waiting for the bootloader to ask for a transfer.
  Synchronizing {
    /// The open device.
    device: D,
  },

  /// Announcing the type and size of a payload.
  SendingHeader {
    /// The open device.
    device: D,

    /// Position of the payload in the session's payload list.
    index: usize,

    /// What the payload carries.
    kind: PayloadKind,
  },

  /// Streaming the body of a payload.
  SendingBody {
    /// The open device.
    device: D,

    /// Position of the payload in the session's payload list.
    index: usize,

    /// What the payload carries.
    kind: PayloadKind,
  },

  /// Every payload was acknowledged; the go command is next.
  Booting {
    /// The open device.
    device: D,
  },

  /// Echoing whatever the booted image prints.
  Relaying {
    /// The open device.
    device: D,
  },

  /// Relaying was stopped and the device released.
  Closed,
}

impl<D> fmt::Display for SessionState<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Disconnected => write!(f, "Disconnected"),
      Self::Connecting => write!(f, "Connecting"),
      Self::Synchronizing { .. } => write!(f, "Synchronizing"),
      Self::SendingHeader { kind, .. } => write!(f, "SendingHeader({kind})"),
      Self::SendingBody { kind, .. } => write!(f, "SendingBody({kind})"),
      Self::Booting { .. } => write!(f, "Booting"),
      Self::Relaying { .. } => write!(f, "Relaying"),
      Self::Closed => write!(f, "Closed"),
    }
  }
}

/// One upload of a boot image, from opening the device to relaying the
/// output of the booted image.
pub struct Session<C: Connector> {
  connector: C,
  payloads: Vec<Payload>,
  settings: SessionSettings,
  cancel: CancelToken,
  echo: Box<dyn Write>,
  pause: Box<dyn FnMut(Duration)>,
}

impl<C: Connector> Session<C> {
  /// Creates a session which sends `payloads` in order, echoing device output
  /// to stdout and never cancelling on its own.
  pub fn new(
    connector: C,
    payloads: Vec<Payload>,
    settings: SessionSettings,
  ) -> Self {
    Session {
      connector,
      payloads,
      settings,
      cancel: CancelToken::new(),
      echo: Box::new(io::stdout()),
      pause: Box::new(thread::sleep),
    }
  }

  /// Replaces the sink that device output is echoed to.
  pub fn with_echo(mut self, echo: Box<dyn Write>) -> Self {
    self.echo = echo;
    self
  }

  /// Replaces how the session waits between attempts to open the device.
  pub fn with_pause(mut self, pause: impl FnMut(Duration) + 'static) -> Self {
    self.pause = Box::new(pause);
    self
  }

  /// Uses `cancel` to stop the session's waits.
  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// A token which stops this session when cancelled.
  pub fn cancel_token(&self) -> CancelToken {
    self.cancel.clone()
  }

  /// Drives the session through every state until it closes.
  ///
  /// Only returns `Ok` once relaying has been cancelled. Any error ends the
  /// session; the device, if open, is released on the way out.
  pub fn run(mut self) -> TransferResult<()> {
    let mut state = SessionState::Disconnected;

    while !matches!(state, SessionState::Closed) {
      state = self.next(state)?;
      pass!("Transitioned to state: {state}");
    }

    Ok(())
  }

  /// Performs one transition, returning the next state.
  pub fn next(
    &mut self,
    state: SessionState<C::Device>,
  ) -> TransferResult<SessionState<C::Device>> {
    match state {
      SessionState::Disconnected => Ok(SessionState::Connecting),
      SessionState::Connecting => self.connect(),
      SessionState::Synchronizing { mut device } => {
        protocol::wait_for_break(&mut device, self.echo.as_mut(), &self.cancel)?;
        Ok(self.announce(device, 0))
      }
      SessionState::SendingHeader {
        mut device,
        index,
        kind,
      } => {
        self.send_header(&mut device, index)?;
        Ok(SessionState::SendingBody {
          device,
          index,
          kind,
        })
      }
      SessionState::SendingBody {
        mut device,
        index,
        kind,
      } => {
        task!("Sending {kind} to loader.");

        let report = protocol::transmit(
          &mut device,
          self.payloads[index].data(),
          self.settings.chunk_size,
          &self.cancel,
        )?;

        pass!(
          "Sent {} bytes of {kind} in {} chunks.",
          report.bytes,
          report.chunks
        );

        Ok(self.announce(device, index + 1))
      }
      SessionState::Booting { mut device } => {
        task!("Sending go command to start booting.");
        device::write_all(&mut device, &GO_COMMAND)?;
        Ok(SessionState::Relaying { device })
      }
      SessionState::Relaying { mut device } => {
        let relayed =
          protocol::relay(&mut device, self.echo.as_mut(), &self.cancel)?;

        pass!("Stopped relaying after {relayed} bytes.");
        Ok(SessionState::Closed)
      }
      SessionState::Closed => Ok(SessionState::Closed),
    }
  }

  fn connect(&mut self) -> TransferResult<SessionState<C::Device>> {
    if self.cancel.is_cancelled() {
      return Err(TransferError::Cancelled);
    }

    match self.connector.open() {
      Ok(device) => Ok(SessionState::Synchronizing { device }),
      Err(error) if error.is_retryable() => {
        warn!("Waiting for device to be ready ({error}).");
        (self.pause)(self.settings.retry_delay);
        Ok(SessionState::Connecting)
      }
      Err(error) => Err(error),
    }
  }

  fn announce(
    &self,
    device: C::Device,
    index: usize,
  ) -> SessionState<C::Device> {
    match self.payloads.get(index) {
      Some(payload) => SessionState::SendingHeader {
        device,
        index,
        kind: payload.kind(),
      },
      None => SessionState::Booting { device },
    }
  }

  fn send_header(
    &self,
    device: &mut C::Device,
    index: usize,
  ) -> TransferResult<()> {
    let payload = &self.payloads[index];
    let kind = payload.kind();
    let header = payload.header();

    task!("Sending type {kind} ({}) to loader.", kind.tag());
    protocol::send(device, &header.tag_bytes(), &self.cancel)?;

    task!("Sending {kind} file size ({}) to loader.", payload.len());
    protocol::send(device, &header.length_bytes(), &self.cancel)?;

    Ok(())
  }
}

impl<C: Connector> fmt::Debug for Session<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Session")
      .field("payloads", &self.payloads.len())
      .field("settings", &self.settings)
      .field("cancelled", &self.cancel.is_cancelled())
      .finish()
  }
}
