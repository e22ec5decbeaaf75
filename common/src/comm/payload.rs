use crate::ToPrettyString;
use std::fmt;

/// The kind of image carried by a payload, sent to the bootloader as the
/// payload type tag.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum PayloadKind {
  /// The kernel image. Always sent first.
  Kernel = 1,

  /// The initial ramdisk, appended after the kernel.
  Initrd = 2,
}

impl PayloadKind {
  /// The host representation of the type tag for this kind.
  pub fn tag(self) -> u32 {
    self as u32
  }
}

impl fmt::Display for PayloadKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Kernel => write!(f, "kernel"),
      Self::Initrd => write!(f, "initrd"),
    }
  }
}

/// The two words announced before a payload body.
///
/// A freshly built header holds host-order values. Once a platform has
/// prepared it, each word holds the value whose native bytes are exactly what
/// goes on the wire, so the byte accessors never swap anything themselves.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Header {
  /// Payload type tag.
  pub tag: u32,

  /// Payload length in bytes.
  pub length: u32,
}

impl Header {
  /// Creates a host-order header for a payload of the given kind and length.
  pub fn new(kind: PayloadKind, length: u32) -> Self {
    Header {
      tag: kind.tag(),
      length,
    }
  }

  /// Bytes written during the type handshake.
  pub fn tag_bytes(&self) -> [u8; 4] {
    self.tag.to_ne_bytes()
  }

  /// Bytes written during the size handshake.
  pub fn length_bytes(&self) -> [u8; 4] {
    self.length.to_ne_bytes()
  }
}

impl ToPrettyString for Header {
  fn to_pretty_string(&self) -> String {
    let hex = |bytes: [u8; 4]| {
      bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
    };

    format!(
      "type [\x1b[1m{}\x1b[0m] length [\x1b[1m{}\x1b[0m]",
      hex(self.tag_bytes()),
      hex(self.length_bytes()),
    )
  }
}
