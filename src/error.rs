use crate::crypto::hash::Hash256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Corrupt chain: block {0} not found in store")]
    MissingBlock(Hash256),

    #[error("Corrupt chain: block {0} fails proof-of-work validation")]
    CorruptBlock(Hash256),

    #[error("Corrupt chain: malformed tip pointer")]
    CorruptTip,

    #[error("Transaction {0} does not exist")]
    UnknownTransaction(Hash256),

    #[error("Transaction {0} has no output {1}")]
    UnknownOutput(Hash256, u32),

    #[error("Nonce space exhausted at difficulty {0}")]
    NonceExhausted(u32),

    #[error("Block must contain at least one transaction")]
    EmptyBlock,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl From<sled::transaction::TransactionError<ChainError>> for ChainError {
    fn from(err: sled::transaction::TransactionError<ChainError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(e) => e,
            sled::transaction::TransactionError::Storage(e) => ChainError::Storage(e),
        }
    }
}
