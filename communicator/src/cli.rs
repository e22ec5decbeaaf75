use crate::config::Config;
use clap::{value_parser, Arg, ArgMatches, Command};
use common::comm::Platform;
use std::path::PathBuf;

/// Builds the command line interface of the communicator.
pub fn command() -> Command {
  Command::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .about("Sends a kernel, and optionally an initrd, to a serial bootloader.")
    .after_help(
      "Example:\n  communicator -t rpi -d /dev/ttyUSB0 -k kernel.img -i initrd.img",
    )
    .arg(
      Arg::new("target")
        .long("target")
        .short('t')
        .help("Platform the bootloader runs on, such as rpi")
        .value_parser(value_parser!(String)),
    )
    .arg(
      Arg::new("device")
        .long("device")
        .short('d')
        .help("Serial device the bootloader is attached to")
        .value_parser(value_parser!(String)),
    )
    .arg(
      Arg::new("kernel")
        .long("kernel")
        .short('k')
        .help("Kernel image to send")
        .value_parser(value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("initrd")
        .long("initrd")
        .short('i')
        .help("Initial ramdisk to send after the kernel")
        .value_parser(value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("baud")
        .long("baud")
        .short('b')
        .help("Line speed of the serial device [default: 115200]")
        .value_parser(value_parser!(u32)),
    )
    .arg(
      Arg::new("config")
        .long("config")
        .short('c')
        .help("JSON profile providing defaults for the other options")
        .value_parser(value_parser!(PathBuf)),
    )
}

/// Overrides profile values with anything given on the command line.
pub fn apply(mut config: Config, matches: &ArgMatches) -> Config {
  if let Some(target) = matches.get_one::<String>("target") {
    config.target = Some(Platform::from_name(target));
  }

  if let Some(device) = matches.get_one::<String>("device") {
    config.device = Some(device.clone());
  }

  if let Some(kernel) = matches.get_one::<PathBuf>("kernel") {
    config.kernel = Some(kernel.clone());
  }

  if let Some(initrd) = matches.get_one::<PathBuf>("initrd") {
    config.initrd = Some(initrd.clone());
  }

  if let Some(baud) = matches.get_one::<u32>("baud") {
    config.baud_rate = *baud;
  }

  config
}
