use super::Header;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

/// Transforms the header words of a payload into their on-wire form, in
/// place. Payload bodies are never touched.
pub type Preparer = fn(&mut Header);

/// The board family the bootloader runs on.
///
/// Any target name without a dedicated entry is kept as `Other`, which
/// prepares nothing and lets header words through untouched.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
  /// Raspberry Pi boards. Header words are little-endian.
  Rpi,

  /// A target without a preparer, identified by the name it was given.
  Other(String),
}

impl Platform {
  /// Resolves a target name, ignoring case. Never fails.
  pub fn from_name(name: &str) -> Self {
    match name.trim().to_ascii_lowercase().as_str() {
      "rpi" => Platform::Rpi,
      _ => Platform::Other(name.trim().to_owned()),
    }
  }

  /// The name the platform is known by on the command line.
  pub fn name(&self) -> &str {
    match self {
      Self::Rpi => "rpi",
      Self::Other(name) => name,
    }
  }

  /// The preparer registered for this platform, if any.
  pub fn preparer(&self) -> Option<Preparer> {
    match self {
      Self::Rpi => Some(rpi::prepare),
      Self::Other(_) => None,
    }
  }

  /// The inverse of `preparer`, turning on-wire words back into host order.
  pub fn restorer(&self) -> Option<Preparer> {
    match self {
      Self::Rpi => Some(rpi::restore),
      Self::Other(_) => None,
    }
  }

  /// Prepares a header for the wire. Returns `false` if the platform has no
  /// preparer, in which case the header is left as it was.
  pub fn prepare(&self, header: &mut Header) -> bool {
    match self.preparer() {
      Some(prepare) => {
        prepare(header);
        true
      }
      None => false,
    }
  }

  /// Recovers the host-order header from a prepared one.
  pub fn restore(&self, mut header: Header) -> Header {
    if let Some(restore) = self.restorer() {
      restore(&mut header);
    }

    header
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for Platform {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Platform::from_name(s))
  }
}

impl From<String> for Platform {
  fn from(name: String) -> Self {
    Platform::from_name(&name)
  }
}

impl From<Platform> for String {
  fn from(platform: Platform) -> Self {
    platform.name().to_owned()
  }
}

mod rpi {
  use super::Header;

  pub fn prepare(header: &mut Header) {
    header.length = header.length.to_le();
    header.tag = header.tag.to_le();
  }

  pub fn restore(header: &mut Header) {
    header.length = u32::from_le(header.length);
    header.tag = u32::from_le(header.tag);
  }
}
