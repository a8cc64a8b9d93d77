//! Configuration for the supervisor.
//!
//! The [`Config`] struct is not constructable, use [`ConfigBuilder`].
//!
//! # Examples
//!
//! ```
//! # use autohup::config::ConfigBuilder;
//! # use std::path::PathBuf;
//! ConfigBuilder::default()
//!     .cmd(vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()])
//!     .paths(vec![PathBuf::from("/etc/nginx/nginx.conf")])
//!     .script("nginx -t")
//!     .build()
//!     .expect("mission failed");
//! ```

use std::{path::PathBuf, time::Duration};

use nix::sys::signal::Signal;

/// Fixed for the lifetime of the supervisor.
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option))]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Command to supervise (first program, rest arguments).
    pub cmd: Vec<String>,
    /// Paths to watch for changes. May be empty.
    #[builder(default)]
    pub paths: Vec<PathBuf>,
    /// Signal sent to the command after a change.
    #[builder(default = "Signal::SIGHUP")]
    pub signal: Signal,
    /// Shell command run to completion before each signal.
    #[builder(default)]
    pub script: Option<String>,
    /// Quiescence window: changes within it collapse into one trigger.
    #[builder(default = "Duration::from_secs(1)")]
    pub debounce: Duration,
    /// Diagnostic verbosity, as the number of `-v` flags given.
    #[builder(default)]
    pub verbosity: u64,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.cmd.as_ref().map_or(true, Vec::is_empty) {
            return Err("missing command".into());
        }

        if self.debounce == Some(Duration::from_secs(0)) {
            return Err("debounce window must not be zero".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConfigBuilder::default()
            .cmd(vec!["true".to_string()])
            .build()
            .expect("valid config");

        assert_eq!(config.signal, Signal::SIGHUP);
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert_eq!(config.script, None);
        assert!(config.paths.is_empty());
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn command_is_required() {
        assert!(ConfigBuilder::default().build().is_err());
        assert!(ConfigBuilder::default().cmd(Vec::<String>::new()).build().is_err());
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let err = ConfigBuilder::default()
            .cmd(vec!["true".to_string()])
            .debounce(Duration::from_secs(0))
            .build()
            .expect_err("zero window");
        assert!(err.contains("debounce"));
    }
}
