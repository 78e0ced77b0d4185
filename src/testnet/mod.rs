//! Helpers for tests that run real nodes on loopback sockets.

pub mod test_utils;

pub use test_utils::*;
