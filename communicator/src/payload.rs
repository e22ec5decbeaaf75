use crate::error::{TransferError, TransferResult};
use common::{
  comm::{Header, PayloadKind, Platform},
  ToPrettyString,
};
use jeflog::{pass, task, warn};
use std::{fs, path::Path};

/// An image ready to be sent: its bytes, plus the header words already
/// prepared for the target platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payload {
  kind: PayloadKind,
  data: Vec<u8>,
  header: Header,
}

impl Payload {
  /// Builds a payload from image bytes, preparing its header for `platform`.
  ///
  /// A platform without a preparer sends the header in host byte order.
  pub fn new(
    kind: PayloadKind,
    data: Vec<u8>,
    platform: &Platform,
  ) -> TransferResult<Self> {
    let length =
      u32::try_from(data.len()).map_err(|_| TransferError::TooLarge {
        kind,
        length: data.len() as u64,
      })?;

    let mut header = Header::new(kind, length);

    if !platform.prepare(&mut header) {
      warn!(
        "No preparer registered for platform \x1b[1m{platform}\x1b[0m, sending the {kind} header as is."
      );
    }

    Ok(Payload { kind, data, header })
  }

  /// Loads an image from disk and prepares it for `platform`.
  pub fn load(
    kind: PayloadKind,
    path: &Path,
    platform: &Platform,
  ) -> TransferResult<Self> {
    match kind {
      PayloadKind::Kernel => {
        task!("Loading kernel \x1b[1m{}\x1b[0m.", path.display());
      }
      PayloadKind::Initrd => {
        task!(
          "Appending \x1b[1m{}\x1b[0m to kernel for transfer.",
          path.display()
        );
      }
    }

    let payload = Payload::new(kind, load(path)?, platform)?;

    pass!(
      "Loaded {} bytes of {kind}, {}.",
      payload.len(),
      payload.header.to_pretty_string()
    );

    Ok(payload)
  }

  /// What the payload carries.
  pub fn kind(&self) -> PayloadKind {
    self.kind
  }

  /// The header words as they go on the wire.
  pub fn header(&self) -> Header {
    self.header
  }

  /// The image bytes, never altered by preparation.
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Number of image bytes to stream.
  pub fn len(&self) -> usize {
    self.data.len()
  }

  /// Whether the image is empty.
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

/// Reads a whole image into memory.
pub fn load(path: &Path) -> TransferResult<Vec<u8>> {
  fs::read(path).map_err(|source| TransferError::Resource {
    path: path.to_owned(),
    source,
  })
}
