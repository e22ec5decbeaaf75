use crate::error::{TransferError, TransferResult};
use jeflog::task;
use serialport::{DataBits, ErrorKind, FlowControl, Parity, SerialPort, StopBits};
use std::{fs::OpenOptions, io, time::Duration};

/// A byte stream to the bootloader.
///
/// Reads never block for long: a read that finds nothing to return yields
/// `Ok(0)`, and callers are expected to poll.
pub trait Device {
  /// Reads up to `buffer.len()` bytes, returning how many were read.
  fn read_bytes(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

  /// Writes as much of `bytes` as the device accepts in a single call,
  /// returning how many bytes were written.
  fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize>;
}

/// Opens a fresh device each time a session tries to connect.
pub trait Connector {
  /// The device produced by a successful open.
  type Device: Device;

  /// Attempts to open the device.
  ///
  /// Failures which may clear up on their own are reported as
  /// `TransferError::NotReady`.
  fn open(&mut self) -> TransferResult<Self::Device>;
}

/// Everything needed to open and configure the serial line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkSettings {
  /// Path of the serial device, such as `/dev/ttyUSB0`.
  pub path: String,

  /// Line speed. The line always runs 8N1 without flow control.
  pub baud_rate: u32,

  /// How long a single read may wait for data before reporting none.
  pub poll_interval: Duration,
}

/// A serial port opened through `serialport`. The port is closed when this is
/// dropped.
pub struct SerialDevice {
  port: Box<dyn SerialPort>,
}

impl SerialDevice {
  /// Opens and configures the serial device described by `settings`.
  pub fn open(settings: &LinkSettings) -> TransferResult<Self> {
    let port = serialport::new(&settings.path, settings.baud_rate)
      .data_bits(DataBits::Eight)
      .parity(Parity::None)
      .stop_bits(StopBits::One)
      .flow_control(FlowControl::None)
      .timeout(settings.poll_interval)
      .open()
      .map_err(|error| classify(error, open_errno(&settings.path)))?;

    Ok(SerialDevice { port })
  }
}

impl Device for SerialDevice {
  fn read_bytes(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
    match self.port.read(buffer) {
      Err(error) if is_idle(&error) => Ok(0),
      result => result,
    }
  }

  fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
    match self.port.write(bytes) {
      Err(error) if is_idle(&error) => Ok(0),
      result => result,
    }
  }
}

/// Connects to a real serial device.
pub struct SerialConnector {
  settings: LinkSettings,
}

impl SerialConnector {
  /// Creates a connector which opens the device described by `settings`.
  pub fn new(settings: LinkSettings) -> Self {
    SerialConnector { settings }
  }
}

impl Connector for SerialConnector {
  type Device = SerialDevice;

  fn open(&mut self) -> TransferResult<SerialDevice> {
    task!(
      "Opening specified device \x1b[1m{}\x1b[0m at {} baud.",
      self.settings.path,
      self.settings.baud_rate
    );

    SerialDevice::open(&self.settings)
  }
}

/// Sorts an open failure into one worth waiting out and one that is not.
///
/// `serialport` folds several errno values into the same kind, so the errno
/// seen by a plain open of the same node takes precedence when there is one.
/// A node that is missing, not backed by a device or not yet accessible
/// usually means the board is still being enumerated.
pub fn classify(
  error: serialport::Error,
  errno: Option<i32>,
) -> TransferError {
  let retryable = match errno {
    Some(errno) => matches!(errno, libc::ENOENT | libc::ENODEV | libc::EACCES),
    None => matches!(
      error.kind(),
      ErrorKind::Io(io::ErrorKind::NotFound)
        | ErrorKind::Io(io::ErrorKind::PermissionDenied)
    ),
  };

  if retryable {
    TransferError::NotReady(error)
  } else {
    TransferError::Open(error)
  }
}

/// The errno of opening `path` read/write, or `None` if that succeeds.
fn open_errno(path: &str) -> Option<i32> {
  let mut options = OpenOptions::new();
  options.read(true).write(true);

  // never wait for carrier or become the controlling terminal
  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK);
  }

  options.open(path).err().and_then(|error| error.raw_os_error())
}

/// Writes all of `bytes`, continuing after short writes.
///
/// A device which accepts nothing at all is reported as `WriteZero` rather
/// than retried forever.
pub fn write_all<D: Device + ?Sized>(
  device: &mut D,
  mut bytes: &[u8],
) -> io::Result<()> {
  while !bytes.is_empty() {
    match device.write_bytes(bytes) {
      Ok(0) => {
        return Err(io::Error::new(
          io::ErrorKind::WriteZero,
          "device accepted no bytes",
        ));
      }
      Ok(written) => bytes = &bytes[written..],
      Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
      Err(error) => return Err(error),
    }
  }

  Ok(())
}

fn is_idle(error: &io::Error) -> bool {
  matches!(
    error.kind(),
    io::ErrorKind::TimedOut
      | io::ErrorKind::WouldBlock
      | io::ErrorKind::Interrupted
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mocks::MockDevice;

  fn os_error(errno: i32, kind: ErrorKind) -> serialport::Error {
    let description = io::Error::from_raw_os_error(errno).to_string();
    serialport::Error::new(kind, description)
  }

  #[test]
  fn missing_devices_are_not_ready() {
    for errno in [libc::ENOENT, libc::ENODEV, libc::EACCES] {
      let error = classify(os_error(errno, ErrorKind::Unknown), Some(errno));
      assert!(error.is_retryable(), "errno {errno}: {error}");
    }
  }

  #[test]
  fn busy_port_is_fatal() {
    let error =
      classify(os_error(libc::EBUSY, ErrorKind::NoDevice), Some(libc::EBUSY));

    assert!(matches!(error, TransferError::Open(_)));
  }

  #[test]
  fn errno_wins_over_serialport_kind() {
    let no_device = classify(
      os_error(libc::ENODEV, ErrorKind::Unknown),
      Some(libc::ENODEV),
    );
    let not_a_tty = classify(
      os_error(libc::ENOTTY, ErrorKind::Io(io::ErrorKind::NotFound)),
      Some(libc::ENOTTY),
    );

    assert!(matches!(no_device, TransferError::NotReady(_)));
    assert!(matches!(not_a_tty, TransferError::Open(_)));
  }

  #[test]
  fn kind_decides_without_errno() {
    let denied = serialport::Error::new(
      ErrorKind::Io(io::ErrorKind::PermissionDenied),
      "udev has not caught up",
    );
    let absent =
      serialport::Error::new(ErrorKind::Io(io::ErrorKind::NotFound), "absent");
    let invalid = serialport::Error::new(ErrorKind::InvalidInput, "bad baud");
    let busy = serialport::Error::new(ErrorKind::NoDevice, "busy");

    assert!(matches!(classify(denied, None), TransferError::NotReady(_)));
    assert!(matches!(classify(absent, None), TransferError::NotReady(_)));
    assert!(matches!(classify(invalid, None), TransferError::Open(_)));
    assert!(matches!(classify(busy, None), TransferError::Open(_)));
  }

  #[cfg(unix)]
  #[test]
  fn missing_node_reports_enoent() {
    assert_eq!(
      open_errno("/dev/communicator-test-missing-node"),
      Some(libc::ENOENT)
    );
  }

  #[cfg(unix)]
  #[test]
  fn opening_a_missing_node_is_not_ready() {
    let settings = LinkSettings {
      path: "/dev/communicator-test-missing-node".to_owned(),
      baud_rate: 115_200,
      poll_interval: Duration::from_millis(10),
    };

    let error = SerialDevice::open(&settings).err().unwrap();
    assert!(error.is_retryable(), "unexpected error: {error}");
  }

  #[test]
  fn write_all_continues_after_short_writes() {
    let mut device = MockDevice::new().with_max_write(3);
    write_all(&mut device, b"abcdefgh").unwrap();

    assert_eq!(
      device.writes(),
      vec![b"abc".to_vec(), b"def".to_vec(), b"gh".to_vec()]
    );
  }

  #[test]
  fn write_all_rejects_a_stalled_device() {
    let mut device = MockDevice::new().with_max_write(0);
    let error = write_all(&mut device, b"GO").unwrap_err();

    assert_eq!(error.kind(), io::ErrorKind::WriteZero);
  }
}
