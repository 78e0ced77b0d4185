use crate::core::Block;
use log::{debug, info};

/// Reference difficulty: leading hex zeros required on every mined hash.
pub const DEFAULT_DIFFICULTY: usize = 5;

const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Brute-force nonce search for one candidate block.
///
/// Pure CPU work with no shared state. Callers must not hold the node lock
/// while [`ProofOfWork::run`] executes.
pub struct ProofOfWork {
    block: Block,
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(block: Block, difficulty: usize) -> ProofOfWork {
        ProofOfWork { block, difficulty }
    }

    /// True if `hash` starts with `difficulty` hex `'0'` characters.
    pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|c| c == b'0')
    }

    /// Hash is intact and satisfies the difficulty predicate.
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        block.get_hash() == block.compute_hash()
            && Self::meets_difficulty(block.get_hash(), difficulty)
    }

    /// Links the candidate to `tip` and increments the nonce from 0 until the
    /// hash meets the difficulty. Always runs to completion.
    pub fn run(self, tip: &Block) -> Block {
        let ProofOfWork {
            mut block,
            difficulty,
        } = self;
        block.link_to(tip.get_hash());

        info!("Mining block on tip {} with difficulty {difficulty}", tip.get_hash());
        while !Self::meets_difficulty(block.get_hash(), difficulty) {
            block.bump_nonce();
            if block.get_nonce() % PROGRESS_INTERVAL == 0 {
                debug!("Still mining, nonce {}", block.get_nonce());
            }
        }
        info!(
            "Proof-of-work completed for block: {} (nonce: {})",
            block.get_hash(),
            block.get_nonce()
        );
        block
    }
}
