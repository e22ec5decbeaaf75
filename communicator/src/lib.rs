#![warn(missing_docs)]
#![warn(clippy::correctness)]

//! The communicator uploads boot images to a bootloader waiting on a serial
//! line, then relays whatever the booted image prints.

/// Shared flag for stopping a session from the outside.
pub mod cancel;

/// Command line interface of the communicator binary.
pub mod cli;

/// JSON profiles and the settings resolved from them.
pub mod config;

/// The serial device seam, plus the `serialport`-backed implementation.
pub mod device;

/// Errors which can end a transfer.
pub mod error;

/// Loading images from disk into payloads ready to send.
pub mod payload;

/// The individual exchanges of the boot protocol: break synchronization,
/// acknowledged handshakes, chunked transmission and output relay.
pub mod protocol;

/// The state machine which drives one upload from start to finish.
pub mod session;

#[cfg(test)]
mod mocks;

pub use error::{TransferError, TransferResult};
