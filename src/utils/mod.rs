//! Utility functions and helpers
//!
//! Hashing and clock helpers shared by blocks, mining and node startup.

pub mod crypto;

pub use crypto::{current_timestamp, hashing_self_test, sha256_digest, sha256_hex};
