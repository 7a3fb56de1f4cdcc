use crate::crypto::hash::{Hash160, Hash256};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::signatures::Signature;
use crate::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coinbase subsidy per block. Fixed; no halving schedule.
pub const BLOCK_REWARD: u64 = 100;

/// Reference to an output of a prior transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// A transaction input. The coinbase variant carries no prior-output
/// reference and is exempt from signature verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxInput {
    Coinbase {
        data: Vec<u8>,
    },
    Spend {
        outpoint: OutPoint,
        signature: Vec<u8>,
        public_key: Vec<u8>,
    },
}

impl TxInput {
    /// Attribute a spend to an owner: true iff the input's public key hashes
    /// to `pubkey_hash`. Never true for coinbase inputs.
    pub fn uses_key(&self, pubkey_hash: &Hash160) -> bool {
        match self {
            TxInput::Coinbase { .. } => false,
            TxInput::Spend { public_key, .. } => {
                Hash160::hash_sha256(public_key) == *pubkey_hash
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub pubkey_hash: Hash160,
}

impl TxOutput {
    pub fn new(value: u64, pubkey_hash: Hash160) -> Self {
        Self { value, pubkey_hash }
    }

    pub fn is_locked_with(&self, pubkey_hash: &Hash160) -> bool {
        self.pubkey_hash == *pubkey_hash
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Hash256,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Build the reward-issuing transaction for a block. `data` is arbitrary
    /// metadata, never interpreted.
    pub fn new_coinbase(reward_to: Hash160, data: impl Into<Vec<u8>>) -> Result<Self> {
        let mut tx = Self {
            id: Hash256::zero(),
            inputs: vec![TxInput::Coinbase { data: data.into() }],
            outputs: vec![TxOutput::new(BLOCK_REWARD, reward_to)],
        };
        tx.id = tx.compute_id()?;

        Ok(tx)
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self.inputs.as_slice(), [TxInput::Coinbase { .. }])
    }

    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|output| output.value).sum()
    }

    /// Content id: the hash of the transaction with its id zeroed and every
    /// input signature stripped, so the id is stable under signing.
    pub fn compute_id(&self) -> Result<Hash256> {
        let mut stripped = self.clone();
        stripped.id = Hash256::zero();

        for input in &mut stripped.inputs {
            if let TxInput::Spend { signature, .. } = input {
                signature.clear();
            }
        }

        let encoded = bincode::serialize(&stripped)?;
        Ok(Hash256::hash(&encoded))
    }

    /// The copy that gets signed: signatures cleared and each spend input's
    /// public key replaced by the pubkey hash of the output it references.
    /// Produces a new value; the original is never touched.
    fn signing_payload(
        &self,
        prev_txs: &HashMap<Hash256, Transaction>,
    ) -> Result<Transaction> {
        let mut payload = self.clone();
        payload.id = Hash256::zero();

        for input in &mut payload.inputs {
            if let TxInput::Spend {
                outpoint,
                signature,
                public_key,
            } = input
            {
                let prev_tx = prev_txs
                    .get(&outpoint.txid)
                    .ok_or(ChainError::UnknownTransaction(outpoint.txid))?;
                let referenced = prev_tx
                    .outputs
                    .get(outpoint.vout as usize)
                    .ok_or(ChainError::UnknownOutput(outpoint.txid, outpoint.vout))?;

                signature.clear();
                *public_key = referenced.pubkey_hash.as_bytes().to_vec();
            }
        }

        Ok(payload)
    }

    /// Sign every input over the payload digest. Coinbase transactions are
    /// never signed. Fatal if a referenced prior transaction is missing.
    pub fn sign(
        &mut self,
        private_key: &PrivateKey,
        prev_txs: &HashMap<Hash256, Transaction>,
    ) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        let payload = self.signing_payload(prev_txs)?;
        let message = payload.compute_id()?;

        for input in &mut self.inputs {
            if let TxInput::Spend { signature, .. } = input {
                *signature = private_key.sign(&message)?.to_bytes();
            }
        }

        Ok(())
    }

    /// Check every input's signature over the same payload digest used for
    /// signing. Malformed signature or key bytes are a verification failure,
    /// not an error; a missing prior transaction is fatal, mirroring `sign`.
    pub fn verify(&self, prev_txs: &HashMap<Hash256, Transaction>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        let payload = self.signing_payload(prev_txs)?;
        let message = payload.compute_id()?;

        for input in &self.inputs {
            if let TxInput::Spend {
                signature,
                public_key,
                ..
            } = input
            {
                let signature = match Signature::from_bytes(signature) {
                    Ok(sig) => sig,
                    Err(_) => return Ok(false),
                };
                let public_key = match PublicKey::from_bytes(public_key) {
                    Ok(key) => key,
                    Err(_) => return Ok(false),
                };

                if !public_key.verify(&message, &signature)? {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}
