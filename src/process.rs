//! Spawning, signalling and reaping of the supervised command and the
//! trigger script.

use std::io;
use std::process::Command;

use nix::errno::Errno;
use nix::sys::signal::{kill, sigprocmask, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::error::{Error, Result};

/// Spawns the supervised command, `cmd[0]` with the rest as arguments.
pub fn spawn(cmd: &[String]) -> Result<Pid> {
    let (head, tail) = cmd
        .split_first()
        .ok_or_else(|| Error::Usage("missing command".into()))?;
    let mut command = Command::new(head);
    command.args(tail);
    launch(command, head)
}

/// Spawns `sh -c <script>`.
pub fn spawn_script(script: &str) -> Result<Pid> {
    let mut command = Command::new("sh");
    command.arg("-c").arg(script);
    launch(command, script)
}

#[allow(unsafe_code)]
fn launch(mut command: Command, label: &str) -> Result<Pid> {
    use std::os::unix::process::CommandExt;

    debug!("Assembled command {:?}", command);

    // The supervisor runs with its relayed signals blocked; the mask survives
    // exec, so clear it in the child.
    unsafe {
        command.pre_exec(|| {
            sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None)
                .map_err(io::Error::from)
        });
    }

    // Reaping is done by pid through `Tracker::reap`, never through the
    // returned handle.
    let child = command
        .spawn()
        .map_err(|err| Error::Spawn(label.to_owned(), err))?;
    Ok(Pid::from_raw(child.id() as i32))
}

/// Sends `sig` to `pid`.
pub fn signal(pid: Pid, sig: Signal) -> nix::Result<()> {
    kill(pid, sig)
}

/// Exit code as a shell would report it: the code itself, or `128 + n` for a
/// process killed by signal `n`.
pub fn exit_code(status: WaitStatus) -> Option<(Pid, i32)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, code)),
        WaitStatus::Signaled(pid, sig, _) => Some((pid, 128 + sig as i32)),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildState {
    NotStarted,
    Running(Pid),
    Exited(i32),
}

/// Single authority over which descendants are outstanding, and over when
/// the supervisor is done.
///
/// The supervisor is done when the supervised command has exited and no
/// script is outstanding; the command's exit status, recorded once when it
/// is reaped, is then the supervisor's own.
#[derive(Debug)]
pub struct Tracker {
    child: ChildState,
    script: Option<Pid>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub const fn new() -> Self {
        Self {
            child: ChildState::NotStarted,
            script: None,
        }
    }

    pub fn started(&mut self, pid: Pid) {
        debug_assert_eq!(self.child, ChildState::NotStarted);
        self.child = ChildState::Running(pid);
    }

    pub fn script_started(&mut self, pid: Pid) {
        debug_assert!(self.script.is_none(), "overlapping scripts");
        self.script = Some(pid);
    }

    pub const fn state(&self) -> ChildState {
        self.child
    }

    /// The supervised command's pid, while it has not been reaped.
    pub const fn child(&self) -> Option<Pid> {
        match self.child {
            ChildState::Running(pid) => Some(pid),
            _ => None,
        }
    }

    pub const fn script_outstanding(&self) -> bool {
        self.script.is_some()
    }

    pub fn record(&mut self, pid: Pid, code: i32) {
        if self.script == Some(pid) {
            debug!("Script (pid {}) exited with {}", pid, code);
            self.script = None;
        } else if self.child == ChildState::Running(pid) {
            debug!("Child process (pid {}) exited with {}", pid, code);
            self.child = ChildState::Exited(code);
        } else {
            trace!("Reaped unrelated process (pid {})", pid);
        }
    }

    /// The exit code for the supervisor, once nothing is outstanding.
    pub fn finished(&self) -> Option<i32> {
        match (self.child, self.script) {
            (ChildState::Exited(code), None) => Some(code),
            _ => None,
        }
    }

    /// Reaps every descendant that has exited, without blocking.
    pub fn reap(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => {
                    if let Some((pid, code)) = exit_code(status) {
                        self.record(pid, code);
                    }
                }
                Err(Errno::EINTR) => {}
                Err(err) => {
                    warn!("waitpid: {}", err);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn child_exit_finishes() {
        let mut tracker = Tracker::new();
        assert_eq!(tracker.child(), None);
        tracker.started(pid(100));
        assert_eq!(tracker.child(), Some(pid(100)));
        assert_eq!(tracker.finished(), None);

        tracker.record(pid(100), 3);
        assert_eq!(tracker.child(), None);
        assert_eq!(tracker.state(), ChildState::Exited(3));
        assert_eq!(tracker.finished(), Some(3));
    }

    #[test]
    fn script_exit_alone_does_not_finish() {
        let mut tracker = Tracker::new();
        tracker.started(pid(100));
        tracker.script_started(pid(200));
        tracker.record(pid(200), 1);
        assert!(!tracker.script_outstanding());
        assert_eq!(tracker.finished(), None);
        assert_eq!(tracker.child(), Some(pid(100)));
    }

    #[test]
    fn child_exit_during_script_waits_for_script() {
        let mut tracker = Tracker::new();
        tracker.started(pid(100));
        tracker.script_started(pid(200));

        tracker.record(pid(100), 7);
        assert_eq!(tracker.finished(), None);
        assert!(tracker.script_outstanding());

        tracker.record(pid(200), 42);
        assert_eq!(tracker.finished(), Some(7));
    }

    #[test]
    fn unrelated_pids_are_ignored() {
        let mut tracker = Tracker::new();
        tracker.started(pid(100));
        tracker.record(pid(300), 9);
        assert_eq!(tracker.child(), Some(pid(100)));
        assert_eq!(tracker.finished(), None);
    }

    #[test]
    fn exit_status_is_recorded_once() {
        let mut tracker = Tracker::new();
        tracker.started(pid(100));
        tracker.record(pid(100), 0);
        tracker.record(pid(100), 5);
        assert_eq!(tracker.finished(), Some(0));
    }

    #[test]
    fn signalled_exit_codes_follow_the_shell() {
        assert_eq!(
            exit_code(WaitStatus::Exited(pid(1), 4)),
            Some((pid(1), 4))
        );
        assert_eq!(
            exit_code(WaitStatus::Signaled(pid(1), Signal::SIGTERM, false)),
            Some((pid(1), 143))
        );
        assert_eq!(exit_code(WaitStatus::StillAlive), None);
    }

    #[test]
    fn spawn_failure_names_the_command() {
        match spawn(&["autohup-no-such-program".to_string()]) {
            Err(Error::Spawn(label, _)) => assert_eq!(label, "autohup-no-such-program"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(pid) => panic!("spawned {}", pid),
        }
    }

    #[test]
    fn script_runs_through_the_shell() {
        let pid = spawn_script("exit 3").expect("spawn sh");
        let status = waitpid(pid, None).expect("waitpid");
        assert_eq!(exit_code(status), Some((pid, 3)));
    }
}
