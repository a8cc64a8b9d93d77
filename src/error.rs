use std::{error::Error as StdError, fmt, io, path::PathBuf};

pub type Result<T> = ::std::result::Result<T, Error>;

/// Exit code used for every startup, usage and watch failure.
pub const EXIT_ERROR_CODE: i32 = 255;

pub enum Error {
    Usage(String),
    UnknownSignal(String),
    PathNotWatchable(PathBuf, notify::Error),
    Spawn(String, io::Error),
    Watch(notify::Error),
    Signal(nix::Error),
    Io(io::Error),
}

impl Error {
    /// All failures that reach the top of the supervisor are fatal and share
    /// one exit code, distinct from anything the child normally reports.
    pub const fn exit_code(&self) -> i32 {
        EXIT_ERROR_CODE
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<nix::Error> for Error {
    fn from(err: nix::Error) -> Self {
        Error::Signal(err)
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "{}", msg),
            Error::UnknownSignal(name) => write!(f, "{}: Signal cannot be found", name),
            Error::PathNotWatchable(path, err) => write!(f, "{}: {}", path.display(), err),
            Error::Spawn(cmd, err) => write!(f, "{}: {}", cmd, err),
            Error::Watch(err) => write!(f, "watch error: {}", err),
            Error::Signal(err) => write!(f, "signal setup error: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
