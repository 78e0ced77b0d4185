//! Configuration management
//!
//! Node settings: listen address, startup peers, difficulty and
//! a couple of hardening switches. Values come from defaults, an
//! optional TOML file, environment variables and CLI flags.

pub mod settings;

pub use settings::{NodeConfig, DEFAULT_HOST, DEFAULT_PORT};
