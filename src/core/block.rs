use crate::error::Result;
use crate::utils::{current_timestamp, sha256_hex};
use serde::{Deserialize, Serialize};

/// Payload carried by the first block of every ledger.
pub const GENESIS_DATA: &str = "Genesis Block";
/// `previous_hash` sentinel of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// One hash-linked unit of the ledger.
///
/// Fields are only mutated by [`crate::core::ProofOfWork`] while mining.
/// Once a block sits in a [`crate::core::Ledger`] it is never changed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    data: String,
    timestamp: i64,
    nonce: u64,
    previous_hash: String,
    hash: String,
}

impl Block {
    /// Candidate block with no predecessor yet. Mining sets `previous_hash`.
    pub fn new(data: impl Into<String>) -> Result<Block> {
        Ok(Self::with_fields(data.into(), current_timestamp()?, String::new()))
    }

    pub fn genesis() -> Result<Block> {
        Ok(Self::with_fields(
            GENESIS_DATA.to_string(),
            current_timestamp()?,
            GENESIS_PREVIOUS_HASH.to_string(),
        ))
    }

    fn with_fields(data: String, timestamp: i64, previous_hash: String) -> Block {
        let mut block = Block {
            data,
            timestamp,
            nonce: 0,
            previous_hash,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 over `data ++ timestamp ++ nonce ++ previous_hash`, numbers in
    /// decimal, hex-encoded lowercase. Peers recompute this byte-for-byte, so
    /// neither the order nor the formatting may change.
    pub fn compute_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}",
            self.data, self.timestamp, self.nonce, self.previous_hash
        );
        sha256_hex(preimage.as_bytes())
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    pub fn get_data(&self) -> &str {
        self.data.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub(crate) fn link_to(&mut self, previous_hash: &str) {
        self.previous_hash = previous_hash.to_string();
        self.hash = self.compute_hash();
    }

    pub(crate) fn bump_nonce(&mut self) {
        self.nonce += 1;
        self.hash = self.compute_hash();
    }

    /// Block with explicit fields and a recomputed hash (for testing only)
    #[cfg(test)]
    pub fn new_test_block(data: &str, timestamp: i64, nonce: u64, previous_hash: &str) -> Block {
        let mut block = Self::with_fields(data.to_string(), timestamp, previous_hash.to_string());
        block.nonce = nonce;
        block.hash = block.compute_hash();
        block
    }

    #[cfg(test)]
    pub fn tamper_data(&mut self, data: &str) {
        self.data = data.to_string();
    }

    #[cfg(test)]
    pub fn tamper_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    #[cfg(test)]
    pub fn tamper_previous_hash(&mut self, previous_hash: &str) {
        self.previous_hash = previous_hash.to_string();
    }

    #[cfg(test)]
    pub fn tamper_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
    }
}
