use crate::consensus::pow::DIFFICULTY;
use crate::core::transaction::{OutPoint, TxInput, TxOutput};
use crate::core::{Block, Transaction};
use crate::crypto::hash::{Hash160, Hash256};
use crate::crypto::keys::{KeyPair, PrivateKey};
use crate::storage::Database;
use crate::{ChainError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Store key holding the hash of the most recently appended block.
const LAST_HASH_KEY: &[u8] = b"lh";

/// Embedded in the genesis coinbase as metadata; never interpreted.
pub const GENESIS_DATA: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks - Copperchain Genesis";

/// The append-only chain of blocks: a tip hash plus a handle to the store.
/// Single writer by construction; `append` only ever extends the current tip.
#[derive(Debug)]
pub struct Blockchain {
    pub tip: Hash256,
    db: Database,
}

impl Blockchain {
    /// Open the chain at `path`. If no tip is persisted yet, mines a genesis
    /// block holding only `genesis` and commits it together with the tip
    /// pointer; otherwise loads the existing tip. Never re-mines.
    pub fn open<P: AsRef<Path>>(path: P, genesis: Transaction) -> Result<Self> {
        let db = Database::new(path)?;

        if let Some(tip_bytes) = db.get(LAST_HASH_KEY)? {
            let tip = Hash256::from_slice(&tip_bytes).ok_or(ChainError::CorruptTip)?;
            log::debug!("Loaded existing chain at tip {}", tip);
            return Ok(Self { tip, db });
        }

        let genesis_block = Block::genesis(genesis, DIFFICULTY)?;
        let hash = genesis_block.hash;
        let bytes = genesis_block.serialize()?;

        db.run_transaction(|tx| {
            tx.insert(hash.as_bytes(), bytes.clone())?;
            tx.insert(LAST_HASH_KEY, hash.as_bytes().to_vec())?;
            Ok(())
        })?;
        db.flush()?;

        log::info!("🌱 Created genesis block {}", hash);
        Ok(Self { tip: hash, db })
    }

    /// Mine a block of `transactions` on the current tip and persist it. The
    /// block record and the tip pointer commit in one store transaction, so
    /// no reader can observe a half-applied append.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        let block = Block::mine(self.tip, transactions, DIFFICULTY)?;
        let hash = block.hash;
        let bytes = block.serialize()?;

        self.db.run_transaction(|tx| {
            tx.insert(hash.as_bytes(), bytes.clone())?;
            tx.insert(LAST_HASH_KEY, hash.as_bytes().to_vec())?;
            Ok(())
        })?;
        self.db.flush()?;

        self.tip = hash;
        log::info!(
            "⛏️  Appended block {} ({} transactions)",
            hash,
            block.transactions.len()
        );

        Ok(block)
    }

    /// Walk the chain backwards from the current tip down to the genesis
    /// block, inclusive. Each call starts fresh at the tip.
    pub fn iter(&self) -> ChainIterator<'_> {
        ChainIterator {
            current: Some(self.tip),
            db: &self.db,
        }
    }

    /// First transaction in the chain whose id matches, scanning backwards
    /// from the tip.
    pub fn find_transaction(&self, id: &Hash256) -> Result<Option<Transaction>> {
        for block in self.iter() {
            let block = block?;
            for tx in block.transactions {
                if tx.id == *id {
                    return Ok(Some(tx));
                }
            }
        }

        Ok(None)
    }

    /// Resolve every prior transaction referenced by `tx`'s inputs. A
    /// reference that cannot be found is fatal for the operation.
    fn resolve_inputs(&self, tx: &Transaction) -> Result<HashMap<Hash256, Transaction>> {
        let mut prev_txs = HashMap::new();

        for input in &tx.inputs {
            if let TxInput::Spend { outpoint, .. } = input {
                let prev_tx = self
                    .find_transaction(&outpoint.txid)?
                    .ok_or(ChainError::UnknownTransaction(outpoint.txid))?;
                prev_txs.insert(prev_tx.id, prev_tx);
            }
        }

        Ok(prev_txs)
    }

    pub fn sign_transaction(&self, tx: &mut Transaction, private_key: &PrivateKey) -> Result<()> {
        let prev_txs = self.resolve_inputs(tx)?;
        tx.sign(private_key, &prev_txs)
    }

    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool> {
        let prev_txs = self.resolve_inputs(tx)?;
        tx.verify(&prev_txs)
    }

    /// Build and sign a payment of `amount` from `from` to `to`, spending
    /// unspent outputs in scan order and returning change to the sender.
    pub fn create_transaction(
        &self,
        from: &KeyPair,
        to: &Hash160,
        amount: u64,
    ) -> Result<Transaction> {
        let pubkey_hash = from.pubkey_hash();
        let (accumulated, selection) = self.find_spendable_outputs(&pubkey_hash, amount)?;

        if accumulated < amount {
            return Err(ChainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = Vec::new();
        for (txid, vouts) in selection {
            for vout in vouts {
                inputs.push(TxInput::Spend {
                    outpoint: OutPoint::new(txid, vout),
                    signature: Vec::new(),
                    public_key: from.public_key.to_bytes().to_vec(),
                });
            }
        }

        let mut outputs = vec![TxOutput::new(amount, *to)];
        if accumulated > amount {
            outputs.push(TxOutput::new(accumulated - amount, pubkey_hash));
        }

        let mut tx = Transaction {
            id: Hash256::zero(),
            inputs,
            outputs,
        };
        tx.id = tx.compute_id()?;

        self.sign_transaction(&mut tx, &from.private_key)?;

        Ok(tx)
    }
}

/// Lazy backward walk over block history. Yields the genesis block last,
/// then terminates. Read-only; never mutates chain state.
pub struct ChainIterator<'a> {
    current: Option<Hash256>,
    db: &'a Database,
}

impl ChainIterator<'_> {
    fn load(&self, hash: Hash256) -> Result<Block> {
        let bytes = self
            .db
            .get(hash.as_bytes())?
            .ok_or(ChainError::MissingBlock(hash))?;
        let block = Block::deserialize(&bytes)?;

        // Guard against tampering on every reload from storage
        if !block.validate_pow(DIFFICULTY) {
            return Err(ChainError::CorruptBlock(hash));
        }

        Ok(block)
    }
}

impl Iterator for ChainIterator<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current?;

        match self.load(hash) {
            Ok(block) => {
                self.current = if block.is_genesis() {
                    None
                } else {
                    Some(block.prev_hash)
                };
                Some(Ok(block))
            }
            Err(err) => {
                self.current = None;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_chain(dir: &TempDir, owner: &KeyPair) -> Result<Blockchain> {
        let genesis = Transaction::new_coinbase(owner.pubkey_hash(), GENESIS_DATA)?;
        Blockchain::open(dir.path().join("chain.db"), genesis)
    }

    #[test]
    fn test_open_creates_genesis() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let chain = open_chain(&temp_dir, &owner)?;

        let blocks: Vec<Block> = chain.iter().collect::<Result<_>>()?;

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_genesis());
        assert!(blocks[0].transactions[0].is_coinbase());
        assert_eq!(blocks[0].hash, chain.tip);

        Ok(())
    }

    #[test]
    fn test_reopen_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;

        let chain = open_chain(&temp_dir, &owner)?;
        let tip = chain.tip;
        drop(chain);

        // A different genesis owner on reopen must not produce a new chain
        let other = KeyPair::new()?;
        let reopened = open_chain(&temp_dir, &other)?;

        assert_eq!(reopened.tip, tip);

        Ok(())
    }

    #[test]
    fn test_append_advances_tip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let mut chain = open_chain(&temp_dir, &owner)?;
        let genesis_hash = chain.tip;

        let reward = Transaction::new_coinbase(owner.pubkey_hash(), b"second block".to_vec())?;
        let block = chain.append(vec![reward])?;

        assert_eq!(chain.tip, block.hash);
        assert_eq!(block.prev_hash, genesis_hash);

        Ok(())
    }

    #[test]
    fn test_append_empty_rejected() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let mut chain = open_chain(&temp_dir, &owner)?;
        let tip_before = chain.tip;

        let result = chain.append(Vec::new());

        assert!(matches!(result, Err(ChainError::EmptyBlock)));
        assert_eq!(chain.tip, tip_before);

        Ok(())
    }

    #[test]
    fn test_iteration_reaches_genesis() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let mut chain = open_chain(&temp_dir, &owner)?;

        for i in 0..3u8 {
            let reward = Transaction::new_coinbase(owner.pubkey_hash(), vec![i])?;
            chain.append(vec![reward])?;
        }

        let blocks: Vec<Block> = chain.iter().collect::<Result<_>>()?;

        assert_eq!(blocks.len(), 4);
        assert!(blocks.last().unwrap().is_genesis());
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].prev_hash, pair[1].hash);
        }

        Ok(())
    }

    #[test]
    fn test_iteration_restarts_at_tip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let mut chain = open_chain(&temp_dir, &owner)?;

        let reward = Transaction::new_coinbase(owner.pubkey_hash(), b"next".to_vec())?;
        chain.append(vec![reward])?;

        let first_pass = chain.iter().count();
        let second_pass = chain.iter().count();

        assert_eq!(first_pass, 2);
        assert_eq!(second_pass, 2);

        Ok(())
    }

    #[test]
    fn test_find_transaction() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let chain = open_chain(&temp_dir, &owner)?;

        let genesis_block = chain.iter().next().unwrap()?;
        let coinbase_id = genesis_block.transactions[0].id;

        let found = chain.find_transaction(&coinbase_id)?;
        assert_eq!(found.map(|tx| tx.id), Some(coinbase_id));

        let missing = chain.find_transaction(&Hash256::hash(b"no such transaction"))?;
        assert!(missing.is_none());

        Ok(())
    }

    #[test]
    fn test_create_and_verify_transaction() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let sender = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let chain = open_chain(&temp_dir, &sender)?;

        let tx = chain.create_transaction(&sender, &recipient.pubkey_hash(), 30)?;

        assert!(chain.verify_transaction(&tx)?);
        assert_eq!(tx.total_output_value(), 100);

        Ok(())
    }

    #[test]
    fn test_verify_tampered_transaction_fails() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let sender = KeyPair::new()?;
        let recipient = KeyPair::new()?;
        let chain = open_chain(&temp_dir, &sender)?;

        let mut tx = chain.create_transaction(&sender, &recipient.pubkey_hash(), 30)?;
        tx.outputs[0].value = 90;

        assert!(!chain.verify_transaction(&tx)?);

        Ok(())
    }

    #[test]
    fn test_verify_unknown_reference_is_fatal() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let owner = KeyPair::new()?;
        let chain = open_chain(&temp_dir, &owner)?;

        let mut tx = Transaction {
            id: Hash256::zero(),
            inputs: vec![TxInput::Spend {
                outpoint: OutPoint::new(Hash256::hash(b"unconfirmed"), 0),
                signature: Vec::new(),
                public_key: owner.public_key.to_bytes().to_vec(),
            }],
            outputs: vec![TxOutput::new(1, owner.pubkey_hash())],
        };
        tx.id = tx.compute_id()?;

        let result = chain.verify_transaction(&tx);
        assert!(matches!(result, Err(ChainError::UnknownTransaction(_))));

        Ok(())
    }
}
