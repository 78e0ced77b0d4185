//! Core ledger functionality
//!
//! Blocks, the hash-linked ledger that validates them, and the
//! proof-of-work search that produces new blocks.

pub mod block;
pub mod ledger;
pub mod proof_of_work;

pub use block::{Block, GENESIS_DATA, GENESIS_PREVIOUS_HASH};
pub use ledger::Ledger;
pub use proof_of_work::{ProofOfWork, DEFAULT_DIFFICULTY};
