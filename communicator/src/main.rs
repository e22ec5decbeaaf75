use communicator::{
  cli,
  config::Config,
  device::SerialConnector,
  session::Session,
};
use jeflog::{fail, pass};
use std::{path::PathBuf, process};

fn main() {
  pass!(
    "Starting \x1b[1m{}\x1b[0m v{}.",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_VERSION")
  );

  if let Err(error) = run() {
    fail!("{error:#}");
    process::exit(1);
  }
}

fn run() -> anyhow::Result<()> {
  let mut command = cli::command();
  let matches = command.get_matches_mut();

  let profile = match matches.get_one::<PathBuf>("config") {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };

  let settings = match cli::apply(profile, &matches).resolve() {
    Ok(settings) => settings,
    Err(error) => {
      fail!("{error}.");
      eprintln!("{}", command.render_usage());
      process::exit(1);
    }
  };

  let payloads = settings.load_payloads()?;
  let connector = SerialConnector::new(settings.link);

  Session::new(connector, payloads, settings.session).run()?;
  Ok(())
}
