use crate::{
  cancel::CancelToken,
  device::{self, Device},
  error::{TransferError, TransferResult},
};
use common::comm::{STATUS_LEN, STATUS_OK};

/// Writes `bytes` and waits for the bootloader to acknowledge them.
pub fn send<D: Device + ?Sized>(
  device: &mut D,
  bytes: &[u8],
  cancel: &CancelToken,
) -> TransferResult<()> {
  device::write_all(device, bytes)?;
  await_status(device, cancel)
}

/// Reads exactly one status token and checks that it is `OK`.
///
/// The token may arrive split over several reads. No byte past the token is
/// consumed.
pub fn await_status<D: Device + ?Sized>(
  device: &mut D,
  cancel: &CancelToken,
) -> TransferResult<()> {
  let mut status = [0; STATUS_LEN];
  let mut received = 0;

  while received < STATUS_LEN {
    if cancel.is_cancelled() {
      return Err(TransferError::Cancelled);
    }

    received += device.read_bytes(&mut status[received..])?;
  }

  if status != STATUS_OK {
    return Err(TransferError::Protocol { received: status });
  }

  Ok(())
}
