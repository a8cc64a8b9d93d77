use std::io;
use std::process;

use autohup::cli::{self, Action};
use autohup::{run, signal};

fn main() {
    let code = match cli::get_args() {
        Ok(Action::ListSignals) => {
            let _ = signal::list(&mut io::stdout().lock());
            0
        }
        Ok(Action::Supervise(config)) => run(config).unwrap_or_else(|err| {
            eprintln!("autohup: {}", err);
            err.exit_code()
        }),
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    };

    process::exit(code);
}
