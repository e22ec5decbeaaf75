use crate::{cancel::CancelToken, device::Device, error::TransferResult};
use std::io::Write;

/// Echoes everything the booted device prints until `cancel` is tripped,
/// returning how many bytes were relayed.
///
/// Without cancellation this never returns unless the device fails.
pub fn relay<D, W>(
  device: &mut D,
  echo: &mut W,
  cancel: &CancelToken,
) -> TransferResult<usize>
where
  D: Device + ?Sized,
  W: Write + ?Sized,
{
  let mut buffer = [0; 256];
  let mut relayed = 0;

  while !cancel.is_cancelled() {
    let count = device.read_bytes(&mut buffer)?;

    if count == 0 {
      continue;
    }

    super::echo(echo, &buffer[..count]);
    relayed += count;
  }

  Ok(relayed)
}
