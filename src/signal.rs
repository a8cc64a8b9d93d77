//! Signal names, the relay set, and the thread that listens for signals sent
//! to the supervisor itself.

use std::convert::TryFrom;
use std::io::{self, Write};
use std::thread;

use nix::sys::signal::{SigSet, Signal};

use crate::error::{Error, Result};

/// Signals that can be named on the command line.
const SIGNALS: &[(Signal, &str)] = &[
    (Signal::SIGALRM, "ALRM"),
    (Signal::SIGHUP, "HUP"),
    (Signal::SIGINT, "INT"),
    (Signal::SIGQUIT, "QUIT"),
    (Signal::SIGTERM, "TERM"),
    (Signal::SIGURG, "URG"),
    (Signal::SIGUSR1, "USR1"),
    (Signal::SIGUSR2, "USR2"),
    (Signal::SIGWINCH, "WINCH"),
];

/// Signals received by the supervisor that are passed on, verbatim, to the
/// supervised command.
pub const RELAYED: &[Signal] = &[
    Signal::SIGHUP,
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGUSR1,
    Signal::SIGUSR2,
    Signal::SIGTERM,
    Signal::SIGCONT,
];

/// Short name of a signal, without the `SIG` prefix.
pub fn name(signal: Signal) -> &'static str {
    SIGNALS
        .iter()
        .find(|(sig, _)| *sig == signal)
        .map(|(_, name)| *name)
        .unwrap_or_else(|| signal.as_str().trim_start_matches("SIG"))
}

/// Parses a signal given either as a number or as a name.
///
/// Names are matched case-insensitively and the `SIG` prefix is optional, so
/// `hup`, `HUP` and `SIGHUP` all resolve to the same signal. Numbers are not
/// restricted to the named set.
pub fn parse(spec: &str) -> Result<Signal> {
    if let Ok(number) = spec.parse::<i32>() {
        if number != 0 {
            return Signal::try_from(number).map_err(|_| Error::UnknownSignal(spec.to_owned()));
        }
    }

    let bare = match spec.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("SIG") => &spec[3..],
        _ => spec,
    };

    SIGNALS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(bare))
        .map(|(sig, _)| *sig)
        .ok_or_else(|| Error::UnknownSignal(spec.to_owned()))
}

/// Writes every nameable signal, one per line, with its `SIG` prefix.
pub fn list<W: Write>(out: &mut W) -> io::Result<()> {
    for (_, name) in SIGNALS {
        writeln!(out, "SIG{}", name)?;
    }

    Ok(())
}

/// Blocks the relay set and `SIGCHLD` in the calling thread, then spawns a
/// thread that waits for them and hands each one to `handler`.
///
/// Must be called before any other thread is started: the mask propagates to
/// threads started after this point, which is what keeps the signals out of
/// every thread but the listener. The listener stops when `handler` returns
/// false.
#[allow(unsafe_code)]
pub fn install_handler<F>(mut handler: F) -> Result<()>
where
    F: FnMut(Signal) -> bool + Send + 'static,
{
    use nix::libc::c_int;
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler};

    let mut mask = SigSet::empty();
    for &signal in RELAYED {
        mask.add(signal);
    }
    mask.add(Signal::SIGCHLD);
    mask.thread_block()?;

    // Indicate interest in SIGCHLD by setting a dummy handler
    extern "C" fn sigchld_handler(_: c_int) {}

    unsafe {
        sigaction(
            Signal::SIGCHLD,
            &SigAction::new(
                SigHandler::Handler(sigchld_handler),
                SaFlags::SA_NOCLDSTOP,
                SigSet::empty(),
            ),
        )?;
    }

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || loop {
            match mask.wait() {
                Ok(signal) => {
                    trace!("Received {:?}", signal);
                    if !handler(signal) {
                        break;
                    }
                }
                Err(err) => {
                    error!("unable to sigwait: {}", err);
                    break;
                }
            }
        })?;

    Ok(())
}
