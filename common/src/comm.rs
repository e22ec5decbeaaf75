/// Payload kinds and the header words announced ahead of every payload.
pub mod payload;

/// Target platforms and the preparation each applies to header words.
pub mod platform;

pub use payload::{Header, PayloadKind};
pub use platform::{Platform, Preparer};

/// Byte sent by the bootloader to request a transfer. Also known as a break.
pub const BREAK: u8 = 0x03;

/// How many breaks must arrive back to back before a transfer may begin.
pub const BREAKS_REQUIRED: usize = 3;

/// Status token the bootloader answers with after every accepted write.
pub const STATUS_OK: [u8; STATUS_LEN] = *b"OK";

/// Length of every status token, in bytes.
pub const STATUS_LEN: usize = 2;

/// Command which tells the bootloader to start executing the received image.
pub const GO_COMMAND: [u8; 2] = *b"GO";

/// Largest slice of a payload written before waiting for a status token.
///
/// Kept below the receive buffer of typical UARTs so that links without flow
/// control do not overrun.
pub const CHUNK_SIZE: usize = 250;

/// Baud rate the bootloader listens at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
