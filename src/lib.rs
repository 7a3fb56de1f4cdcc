//! Copperchain - a single-node proof-of-work ledger
//!
//! This library implements an append-only blockchain core with:
//! - SHA-256 proof-of-work mining and validation
//! - UTXO-based transaction model with ECDSA signatures
//! - Chain-scan UTXO resolution and spendable-output selection
//! - sled-backed persistent chain store with atomic tip updates

pub mod consensus;
pub mod core;
pub mod crypto;
pub mod error;
pub mod storage;

pub use crate::core::{Block, Blockchain, Transaction};
pub use error::{ChainError, Result};
