//! The node's local copy of the chain: an append-only list of blocks where
//! index 0 is genesis and every later block links to its predecessor by hash.

use crate::core::{Block, ProofOfWork};
use crate::error::{LedgerError, Result};
use log::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    chain: Vec<Block>,
}

impl Ledger {
    /// Ledger with no blocks. Only used while a node is bootstrapping.
    pub fn empty() -> Ledger {
        Ledger { chain: Vec::new() }
    }

    pub fn with_genesis() -> Result<Ledger> {
        Ok(Ledger {
            chain: vec![Block::genesis()?],
        })
    }

    /// Adopt a chain as-is, e.g. a snapshot received from a peer.
    pub fn from_blocks(blocks: Vec<Block>) -> Ledger {
        Ledger { chain: blocks }
    }

    pub fn tip(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyLedger)
    }

    pub fn blocks(&self) -> &[Block] {
        self.chain.as_slice()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Walks the whole chain. For every block after genesis: the hash has
    /// `difficulty` leading zeros, matches the recomputed digest, and the
    /// block links to its predecessor.
    pub fn validate(&self, difficulty: usize) -> bool {
        for (i, pair) in self.chain.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);

            if !ProofOfWork::meets_difficulty(current.get_hash(), difficulty) {
                debug!("Block {} fails difficulty {difficulty}", i + 1);
                return false;
            }
            if current.get_hash() != current.compute_hash() {
                debug!("Block {} hash does not match its contents", i + 1);
                return false;
            }
            if current.get_previous_hash() != previous.get_hash() {
                debug!("Block {} does not link to block {i}", i + 1);
                return false;
            }
        }
        true
    }

    /// Appends `block` and re-validates the full chain. The append is also
    /// refused when the tip hash did not change. Rejected blocks are rolled
    /// back, leaving the ledger exactly as it was.
    pub fn append_if_valid(&mut self, block: Block, difficulty: usize) -> bool {
        let previous_tip_hash = match self.tip() {
            Ok(tip) => tip.get_hash().to_string(),
            Err(_) => return false,
        };

        self.chain.push(block);

        let tip_unchanged = self
            .chain
            .last()
            .is_some_and(|tip| tip.get_hash() == previous_tip_hash);

        if tip_unchanged || !self.validate(difficulty) {
            self.chain.pop();
            return false;
        }
        true
    }
}
