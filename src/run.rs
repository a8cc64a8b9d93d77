use std::io::{self, Write};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Instant;

use log::LevelFilter;
use nix::sys::signal::Signal;

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::process::{self, Tracker};
use crate::signal;
use crate::watcher::Watcher;

fn init_logger(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let _ = env_logger::Builder::new()
        .format(|buf, r| writeln!(buf, "*** {}", r.args()))
        .filter(None, LevelFilter::Warn)
        .filter(Some("autohup"), level)
        .try_init();
}

/// Runs the supervisor until the supervised command has exited, returning the
/// exit code the supervisor should exit with.
pub fn run(config: Config) -> Result<i32> {
    init_logger(config.verbosity);

    let (tx, rx) = channel();

    // Must come first: the signal mask is inherited by the watcher's threads.
    let signals = tx.clone();
    signal::install_handler(move |sig| signals.send(Event::Signal(sig)).is_ok())?;

    let _watcher = Watcher::new(tx, &config.paths)?;

    let pid = process::spawn(&config.cmd)?;
    debug!("Started {:?} as pid {}", config.cmd, pid);

    let mut tracker = Tracker::new();
    tracker.started(pid);

    Supervisor {
        debouncer: Debouncer::new(config.debounce),
        config,
        tracker,
        events: rx,
    }
    .main_loop()
}

/// Owns all mutable supervisor state. Only the thread running the loop ever
/// touches it; signal and watcher threads talk to it through `events`.
struct Supervisor {
    config: Config,
    tracker: Tracker,
    debouncer: Debouncer,
    events: Receiver<Event>,
}

impl Supervisor {
    fn main_loop(mut self) -> Result<i32> {
        loop {
            let next = match self.debouncer.timeout(Instant::now()) {
                None => Some(self.recv()?),
                Some(timeout) => match self.events.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return Err(disconnected()),
                },
            };

            if let Some(event) = next {
                if let Some(code) = self.handle(event)? {
                    return Ok(code);
                }
            }

            if self.debouncer.is_due(Instant::now()) {
                if let Some(code) = self.trigger()? {
                    return Ok(code);
                }
            }
        }
    }

    fn recv(&self) -> Result<Event> {
        self.events.recv().map_err(|_| disconnected())
    }

    /// Returns the supervisor's exit code once it should stop.
    fn handle(&mut self, event: Event) -> Result<Option<i32>> {
        match event {
            Event::Change(class) => {
                if self.debouncer.observe(Instant::now()) {
                    debug!(
                        "{:?} detected, signalling in {:?}",
                        class,
                        self.debouncer.window()
                    );
                }
            }
            Event::Signal(Signal::SIGCHLD) => {
                self.tracker.reap();
                return Ok(self.tracker.finished());
            }
            Event::Signal(sig) => {
                debug!("Relaying {} to child process", signal::name(sig));
                self.forward(sig);
            }
            Event::WatchError(err) => return Err(Error::Watch(err)),
        }

        Ok(None)
    }

    /// The debounced action: script, then signal, then drop whatever changes
    /// queued up in the meantime.
    fn trigger(&mut self) -> Result<Option<i32>> {
        debug!("Changes settled, triggering");

        if let Some(code) = self.run_script()? {
            return Ok(Some(code));
        }

        debug!(
            "Sending signal {} to child process",
            signal::name(self.config.signal)
        );
        self.forward(self.config.signal);

        loop {
            match self.events.try_recv() {
                Ok(Event::Change(_)) => {}
                Ok(event) => {
                    if let Some(code) = self.handle(event)? {
                        return Ok(Some(code));
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(disconnected()),
            }
        }

        self.debouncer.reset();
        Ok(None)
    }

    /// Runs the script, if any, and waits until it has been reaped. Relayed
    /// signals and other exits are still handled meanwhile; changes are not.
    fn run_script(&mut self) -> Result<Option<i32>> {
        let pid = match &self.config.script {
            None => return Ok(None),
            Some(script) => match process::spawn_script(script) {
                Ok(pid) => pid,
                Err(err) => {
                    error!("{}", err);
                    return Ok(None);
                }
            },
        };

        debug!("Running script as pid {}", pid);
        self.tracker.script_started(pid);

        while self.tracker.script_outstanding() {
            match self.recv()? {
                Event::Change(_) => {}
                event => {
                    if let Some(code) = self.handle(event)? {
                        return Ok(Some(code));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Delivers `sig` to the supervised command, if it is still around.
    fn forward(&self, sig: Signal) {
        if let Some(pid) = self.tracker.child() {
            if let Err(err) = process::signal(pid, sig) {
                debug!("Could not send {} to pid {}: {}", signal::name(sig), pid, err);
            }
        }
    }
}

fn disconnected() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "signal and watch sources are gone",
    ))
}
