use crate::{
  cancel::CancelToken,
  device::Device,
  error::{TransferError, TransferResult},
};
use common::comm::{BREAK, BREAKS_REQUIRED};
use jeflog::{pass, task};
use std::io::Write;

/// Blocks until the bootloader has sent `BREAKS_REQUIRED` breaks in a row.
///
/// Anything else the device prints meanwhile resets the count and is echoed,
/// since it is usually the bootloader's own banner. Returns as soon as the
/// last break is read, leaving any later bytes unread.
pub fn wait_for_break<D, W>(
  device: &mut D,
  echo: &mut W,
  cancel: &CancelToken,
) -> TransferResult<()>
where
  D: Device + ?Sized,
  W: Write + ?Sized,
{
  task!("Listening for {BREAKS_REQUIRED} breaks from loader in a row.");

  let mut breaks = 0;
  let mut byte = [0; 1];

  while breaks < BREAKS_REQUIRED {
    if cancel.is_cancelled() {
      return Err(TransferError::Cancelled);
    }

    if device.read_bytes(&mut byte)? == 0 {
      continue;
    }

    if byte[0] == BREAK {
      breaks += 1;
      continue;
    }

    breaks = 0;
    super::echo(echo, &byte);
  }

  pass!("Received {BREAKS_REQUIRED} breaks from loader.");
  Ok(())
}
