use crate::crypto::hash::Hash256;
use crate::{ChainError, Result};

/// Number of leading zero bits a block hash must have. Fixed for the whole
/// process; there is no retargeting.
pub const DIFFICULTY: u32 = 16;

/// The proof-of-work puzzle for one block: grind a nonce until the candidate
/// hash falls below the difficulty target.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    prev_hash: Hash256,
    tx_digest: Hash256,
    difficulty: u32,
    target: [u8; 32],
}

impl ProofOfWork {
    pub fn new(prev_hash: Hash256, tx_digest: Hash256, difficulty: u32) -> Self {
        Self {
            prev_hash,
            tx_digest,
            difficulty,
            target: target_mask(difficulty),
        }
    }

    /// Candidate bytes hashed for a given nonce trial.
    fn candidate(&self, nonce: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + 32 + 8 + 4);
        data.extend_from_slice(self.prev_hash.as_bytes());
        data.extend_from_slice(self.tx_digest.as_bytes());
        data.extend_from_slice(&nonce.to_le_bytes());
        data.extend_from_slice(&self.difficulty.to_le_bytes());
        data
    }

    /// True iff `hash`, read as a big-endian integer, is strictly less than
    /// 2^(256 - difficulty). The mask is that bound minus one, so plain
    /// byte-wise ordering gives the strict comparison.
    pub fn meets_target(&self, hash: &Hash256) -> bool {
        hash.as_bytes().as_slice() <= self.target.as_slice()
    }

    /// Grind nonces starting at zero until the target is met. Exhausting the
    /// nonce range means the difficulty is misconfigured; that is fatal, not
    /// retried.
    pub fn run(&self) -> Result<(u64, Hash256)> {
        let mut nonce: u64 = 0;

        loop {
            let hash = Hash256::hash(&self.candidate(nonce));

            if self.meets_target(&hash) {
                log::debug!("⛏️  Found nonce {} after proof-of-work search", nonce);
                return Ok((nonce, hash));
            }

            nonce = match nonce.checked_add(1) {
                Some(next) => next,
                None => return Err(ChainError::NonceExhausted(self.difficulty)),
            };
        }
    }

    /// Recompute the candidate for a stored nonce and check it against both
    /// the claimed hash and the target.
    pub fn validate(&self, nonce: u64, claimed_hash: &Hash256) -> bool {
        let hash = Hash256::hash(&self.candidate(nonce));
        hash == *claimed_hash && self.meets_target(&hash)
    }
}

/// Largest 32-byte value with `difficulty` leading zero bits.
fn target_mask(difficulty: u32) -> [u8; 32] {
    let mut target = [0xFFu8; 32];

    let zero_bytes = (difficulty / 8) as usize;
    let remaining_bits = difficulty % 8;

    for byte in target.iter_mut().take(zero_bytes.min(32)) {
        *byte = 0x00;
    }

    if zero_bytes < 32 && remaining_bits > 0 {
        target[zero_bytes] = 0xFF >> remaining_bits;
    }

    target
}
