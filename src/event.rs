//! Everything the supervisor reacts to arrives as an [`Event`] on one channel.

use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind};
use nix::sys::signal::Signal;

/// The classes of filesystem change that can trigger the supervised command.
///
/// This set is fixed; every other kind of notification is dropped before it
/// reaches the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeClass {
    /// A file opened for writing was closed.
    WriteClose,
    /// Permissions, ownership or timestamps changed.
    Attribute,
    Create,
    Rename,
    Remove,
}

impl ChangeClass {
    pub fn classify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(Self::WriteClose),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(Self::Attribute),
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Rename),
            EventKind::Create(_) => Some(Self::Create),
            EventKind::Remove(_) => Some(Self::Remove),
            // backends without close events only ever report plain writes
            #[cfg(not(target_os = "linux"))]
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                Some(Self::WriteClose)
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    /// A watched path changed.
    Change(ChangeClass),
    /// The supervisor received a signal.
    Signal(Signal),
    /// The watcher failed after startup.
    WatchError(notify::Error),
}
