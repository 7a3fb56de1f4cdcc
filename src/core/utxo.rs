use crate::core::blockchain::Blockchain;
use crate::core::transaction::{OutPoint, TxInput, TxOutput};
use crate::crypto::hash::{Hash160, Hash256};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An unspent output together with its position in the chain. Derived by
/// scanning; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Utxo {
    pub txid: Hash256,
    pub vout: u32,
    pub output: TxOutput,
}

impl Blockchain {
    /// All outputs locked to `pubkey_hash` that no later input spends.
    ///
    /// Two full scans: the first collects the outpoints consumed by inputs
    /// attributable to the key, the second keeps every matching output whose
    /// outpoint is absent from that spent-set. O(chain length x transactions
    /// per block) on every call; an incrementally maintained index would sit
    /// behind this same contract.
    pub fn find_utxos(&self, pubkey_hash: &Hash160) -> Result<Vec<Utxo>> {
        let mut spent: HashSet<OutPoint> = HashSet::new();

        for block in self.iter() {
            let block = block?;
            for tx in &block.transactions {
                if tx.is_coinbase() {
                    continue;
                }
                for input in &tx.inputs {
                    if let TxInput::Spend { outpoint, .. } = input {
                        if input.uses_key(pubkey_hash) {
                            spent.insert(*outpoint);
                        }
                    }
                }
            }
        }

        let mut utxos = Vec::new();

        for block in self.iter() {
            let block = block?;
            for tx in &block.transactions {
                for (vout, output) in tx.outputs.iter().enumerate() {
                    let outpoint = OutPoint::new(tx.id, vout as u32);
                    if output.is_locked_with(pubkey_hash) && !spent.contains(&outpoint) {
                        utxos.push(Utxo {
                            txid: tx.id,
                            vout: vout as u32,
                            output: output.clone(),
                        });
                    }
                }
            }
        }

        Ok(utxos)
    }

    /// Accumulate unspent outputs in scan order until `amount` is covered,
    /// stopping early. The accumulated total may fall short of `amount`;
    /// that is a normal result the caller must check, not an error.
    pub fn find_spendable_outputs(
        &self,
        pubkey_hash: &Hash160,
        amount: u64,
    ) -> Result<(u64, HashMap<Hash256, Vec<u32>>)> {
        let mut accumulated = 0u64;
        let mut selection: HashMap<Hash256, Vec<u32>> = HashMap::new();

        for utxo in self.find_utxos(pubkey_hash)? {
            if accumulated >= amount {
                break;
            }

            accumulated += utxo.output.value;
            selection.entry(utxo.txid).or_default().push(utxo.vout);
        }

        Ok((accumulated, selection))
    }

    pub fn get_balance(&self, pubkey_hash: &Hash160) -> Result<u64> {
        let utxos = self.find_utxos(pubkey_hash)?;
        Ok(utxos.iter().map(|utxo| utxo.output.value).sum())
    }
}
