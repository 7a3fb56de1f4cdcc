use crate::{ChainError, Result};
use sled::transaction::{ConflictableTransactionError, TransactionalTree};
use std::path::Path;

/// Thin wrapper over the key-value engine. The chain store only relies on
/// get/put plus an atomic read-modify-write transaction; everything else
/// about the engine is an implementation detail.
#[derive(Debug, Clone)]
pub struct Database {
    db: sled::Db,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    pub fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Run `f` against a transactional view of the store. All writes commit
    /// atomically iff `f` returns Ok; reads inside `f` observe its own prior
    /// writes. An abort surfaces the carried error unchanged.
    pub fn run_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: Fn(&TransactionalTree) -> std::result::Result<T, ConflictableTransactionError<ChainError>>,
    {
        let result = self.db.transaction(f)?;
        Ok(result)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
