use crate::{
  device::LinkSettings,
  error::TransferResult,
  payload::Payload,
  session::SessionSettings,
};
use anyhow::{bail, Context};
use common::comm::{PayloadKind, Platform, CHUNK_SIZE, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

/// A profile for one board, as stored in a JSON file. Anything left out of the
/// file takes its default, and anything given on the command line wins.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
  /// Path of the serial device.
  pub device: Option<String>,

  /// Platform the bootloader runs on.
  pub target: Option<Platform>,

  /// Kernel image to send.
  pub kernel: Option<PathBuf>,

  /// Initial ramdisk sent after the kernel, if any.
  pub initrd: Option<PathBuf>,

  /// Line speed of the serial device.
  pub baud_rate: u32,

  /// Largest number of bytes written per acknowledged chunk.
  pub chunk_size: usize,

  /// Milliseconds to wait before opening a device which was not ready.
  pub retry_delay_ms: u64,

  /// Milliseconds a single read may wait for data.
  pub poll_interval_ms: u64,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      device: None,
      target: None,
      kernel: None,
      initrd: None,
      baud_rate: DEFAULT_BAUD_RATE,
      chunk_size: CHUNK_SIZE,
      retry_delay_ms: 1000,
      poll_interval_ms: 10,
    }
  }
}

impl Config {
  /// Reads a profile from a JSON file.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path).with_context(|| {
      format!("failed to read config file {}", path.display())
    })?;

    serde_json::from_str(&raw).with_context(|| {
      format!("failed to parse config file {}", path.display())
    })
  }

  /// Checks that everything needed for a session is present.
  pub fn resolve(self) -> anyhow::Result<Settings> {
    let Some(target) = self.target else {
      bail!("no target platform given");
    };

    let Some(device) = self.device else {
      bail!("no serial device given");
    };

    let Some(kernel) = self.kernel else {
      bail!("no kernel image given");
    };

    if self.chunk_size == 0 {
      bail!("chunk size must be at least one byte");
    }

    if self.chunk_size > CHUNK_SIZE {
      bail!(
        "chunk size of {} bytes exceeds the {CHUNK_SIZE} bytes the loader accepts",
        self.chunk_size
      );
    }

    Ok(Settings {
      link: LinkSettings {
        path: device,
        baud_rate: self.baud_rate,
        poll_interval: Duration::from_millis(self.poll_interval_ms),
      },
      target,
      kernel,
      initrd: self.initrd,
      session: SessionSettings {
        chunk_size: self.chunk_size,
        retry_delay: Duration::from_millis(self.retry_delay_ms),
      },
    })
  }
}

/// A complete, validated configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
  /// How to open the serial device.
  pub link: LinkSettings,

  /// Platform the header words are prepared for.
  pub target: Platform,

  /// Kernel image to send.
  pub kernel: PathBuf,

  /// Initial ramdisk sent after the kernel, if any.
  pub initrd: Option<PathBuf>,

  /// Tunables passed on to the session.
  pub session: SessionSettings,
}

impl Settings {
  /// Loads every configured image in the order it is sent. Fails before any
  /// device is touched if an image cannot be read.
  pub fn load_payloads(&self) -> TransferResult<Vec<Payload>> {
    let mut payloads =
      vec![Payload::load(PayloadKind::Kernel, &self.kernel, &self.target)?];

    if let Some(initrd) = &self.initrd {
      payloads.push(Payload::load(PayloadKind::Initrd, initrd, &self.target)?);
    }

    Ok(payloads)
  }
}
