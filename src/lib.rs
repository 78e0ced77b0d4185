//! # hashlink-node - a minimal peer-to-peer ledger
//!
//! Every node keeps its own append-only chain of hash-linked blocks and
//! talks to its peers over plain TCP. A node joining the network asks the
//! first peer it reaches for its whole chain, then follows along: every
//! block it accepts, mined locally or received, is validated against the
//! full chain and flooded to all connected peers.
//!
//! ## Layout
//! - `core/`: blocks, the ledger and its validation, proof-of-work
//! - `network/`: wire messages, peer registry, the node and its threads
//! - `config/`: node settings (defaults, TOML file, environment)
//! - `utils/`: SHA-256 helpers and the millisecond clock
//! - `cli/`: arguments and menu parsing for the node binary
//!
//! ## Things to keep in mind
//! - One mutex guards the ledger and the peer set together. Mining never
//!   holds it.
//! - There is no fork resolution. A block mined against a tip that moved
//!   in the meantime is rejected.
//! - Accepted blocks are re-sent to every peer, including their sender.
//!   The echo dies out because the block no longer links to the tip.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;

#[cfg(test)]
pub mod testnet;

pub use cli::{MenuCommand, Opt};
pub use config::NodeConfig;
pub use core::{Block, Ledger, ProofOfWork, DEFAULT_DIFFICULTY};
pub use error::{LedgerError, Result};
pub use network::{Handshake, Node, Package, PeerId};
pub use utils::{current_timestamp, sha256_hex};
