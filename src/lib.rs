//! autohup: the library
//!
//! Supervises one long-running command and sends it a signal whenever one of
//! the watched paths changes. The binary is a thin wrapper over [`run`]; the
//! library exists so that the pieces of the supervisor can be tested on their
//! own, and no semver guarantees apply to it.

#![warn(clippy::unwrap_used)]
#![deny(unsafe_code)]
#![allow(clippy::default_trait_access)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;

pub mod cli;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod process;
pub mod run;
pub mod signal;
mod watcher;

pub use run::run;
