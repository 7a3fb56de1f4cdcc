//! Core ledger components

pub mod block;
pub mod blockchain;
pub mod transaction;
pub mod utxo;

pub use block::Block;
pub use blockchain::{Blockchain, ChainIterator, GENESIS_DATA};
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput, BLOCK_REWARD};
pub use utxo::Utxo;
