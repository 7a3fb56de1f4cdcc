use crate::consensus::pow::ProofOfWork;
use crate::core::Transaction;
use crate::crypto::hash::Hash256;
use crate::{ChainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub hash: Hash256,
    pub prev_hash: Hash256,
    pub nonce: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Construct a block by mining: runs proof-of-work over the transaction
    /// digest and the previous hash. The empty-list check happens before any
    /// mining work starts.
    pub fn mine(
        prev_hash: Hash256,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Result<Self> {
        if transactions.is_empty() {
            return Err(ChainError::EmptyBlock);
        }

        let tx_digest = Self::hash_transactions(&transactions);
        let pow = ProofOfWork::new(prev_hash, tx_digest, difficulty);
        let (nonce, hash) = pow.run()?;

        Ok(Self {
            hash,
            prev_hash,
            nonce,
            transactions,
        })
    }

    /// The first block: empty previous hash, a single coinbase transaction.
    pub fn genesis(coinbase: Transaction, difficulty: u32) -> Result<Self> {
        Self::mine(Hash256::zero(), vec![coinbase], difficulty)
    }

    /// Digest binding the block to the exact set and order of its
    /// transactions: the concatenated ids, hashed once.
    pub fn hash_transactions(transactions: &[Transaction]) -> Hash256 {
        let mut data = Vec::with_capacity(transactions.len() * 32);
        for tx in transactions {
            data.extend_from_slice(tx.id.as_bytes());
        }

        Hash256::hash(&data)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_zero()
    }

    /// Re-run proof-of-work validation against the stored nonce and hash.
    /// Used at append time and on every reload from storage.
    pub fn validate_pow(&self, difficulty: u32) -> bool {
        let tx_digest = Self::hash_transactions(&self.transactions);
        let pow = ProofOfWork::new(self.prev_hash, tx_digest, difficulty);
        pow.validate(self.nonce, &self.hash)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}
