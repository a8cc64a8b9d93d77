use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{App, Arg, ErrorKind};

use crate::config::{Config, ConfigBuilder};
use crate::error::{Error, Result};
use crate::signal;

/// What the command line asked for.
#[derive(Debug)]
pub enum Action {
    ListSignals,
    Supervise(Config),
}

fn app() -> App<'static, 'static> {
    App::new("autohup")
        .version(crate_version!())
        .about("Send a signal to a command when watched files change")
        .usage(
            "autohup [-s signal] [-e command] [-v] [path ...] -- command [argument ...]\n    \
             autohup -l",
        )
        .arg(Arg::with_name("path")
                 .help("Path to watch")
                 .multiple(true))
        .arg(Arg::with_name("command")
                 .help("Command to supervise, with its arguments")
                 .multiple(true)
                 .last(true)
                 .required_unless("list"))
        .arg(Arg::with_name("signal")
                 .help("Signal to send upon changes, by name or number [default: HUP]")
                 .short("s")
                 .long("signal")
                 .takes_value(true)
                 .value_name("signal"))
        .arg(Arg::with_name("exec")
                 .help("Shell command to run to completion before each signal")
                 .short("e")
                 .long("exec")
                 .takes_value(true)
                 .value_name("command"))
        .arg(Arg::with_name("debounce")
                 .help("Time to collect changes before signalling [default: 1000]")
                 .short("d")
                 .long("debounce")
                 .takes_value(true)
                 .value_name("milliseconds"))
        .arg(Arg::with_name("verbose")
                 .help("Print debugging messages to stderr, repeat for more")
                 .short("v")
                 .long("verbose")
                 .multiple(true))
        .arg(Arg::with_name("list")
                 .help("List signal names and exit")
                 .short("l")
                 .long("list"))
}

pub fn get_args() -> Result<Action> {
    get_args_from(std::env::args_os())
}

/// Help and version requests print and exit the process directly; every
/// other parse failure is returned as [`Error::Usage`].
pub fn get_args_from<I, T>(args: I) -> Result<Action>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = app().get_matches_from_safe(args).map_err(|err| match err.kind {
        ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => err.exit(),
        _ => Error::Usage(err.message),
    })?;

    if args.is_present("list") {
        return Ok(Action::ListSignals);
    }

    let mut builder = ConfigBuilder::default();
    builder
        .cmd(args.values_of_lossy("command").unwrap_or_default())
        .paths(
            args.values_of_os("path")
                .map(|paths| paths.map(PathBuf::from).collect::<Vec<_>>())
                .unwrap_or_default(),
        )
        .verbosity(args.occurrences_of("verbose"));

    if let Some(spec) = args.value_of("signal") {
        builder.signal(signal::parse(spec)?);
    }

    if let Some(script) = args.value_of("exec") {
        builder.script(script);
    }

    if args.is_present("debounce") {
        let ms = value_t!(args, "debounce", u64).map_err(|err| Error::Usage(err.message))?;
        builder.debounce(Duration::from_millis(ms));
    }

    builder.build().map(Action::Supervise).map_err(Error::Usage)
}
