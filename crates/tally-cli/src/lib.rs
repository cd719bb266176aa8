//! Tally CLI library.
//!
//! This crate provides the command-line front end: argument parsing,
//! configuration, the tokio tick source and the interactive session.

mod cli;
pub mod commands;
mod config;
pub mod session;
pub mod ticker;

pub use cli::{Cli, Commands};
pub use config::Config;
