use jeflog::warn;
use std::io::Write;

mod handshake;
mod relay;
mod sync;
mod transmit;

pub use handshake::{await_status, send};
pub use relay::relay;
pub use sync::wait_for_break;
pub use transmit::{transmit, TransferReport};

/// Copies device output to `sink`. A sink that fails is reported and the
/// bytes are dropped; the device is still read.
fn echo<W: Write + ?Sized>(sink: &mut W, bytes: &[u8]) {
  if let Err(error) = sink.write_all(bytes).and_then(|()| sink.flush()) {
    warn!("Failed to echo device output: {error}");
  }
}
