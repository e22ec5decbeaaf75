#![warn(missing_docs)]

//! Common consists of the shared vocabulary of the serial boot protocol. More
//! specifically, the constants, payload kinds and header words that travel
//! over the wire between the host communicator and the bootloader, along with
//! the per-platform preparation applied to those words, are all stored here.

/// All structs and definitions related to communication with the bootloader.
pub mod comm;

/// Trait providing a method to create a pretty, terminal-friendly
/// representation of the underlying.
pub trait ToPrettyString {
  /// Provides a representation of the underlying which is preferable when
  /// displaying to the console but not as a raw string.
  ///
  /// ANSI codes such as color codes, for example, can be used in a "pretty
  /// string" but would be atypical in a `fmt::Display` implementation.
  fn to_pretty_string(&self) -> String;
}
