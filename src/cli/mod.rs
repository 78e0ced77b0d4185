//! Command-line interface
//!
//! Startup arguments and the interactive menu of the node binary.

pub mod commands;

pub use commands::{MenuCommand, Opt};
