//! Persistence layer backed by sled

pub mod database;

pub use database::Database;
