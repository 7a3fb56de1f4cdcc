//! Cryptographic primitives for Copperchain

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{Hash160, Hash256};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use signatures::Signature;
