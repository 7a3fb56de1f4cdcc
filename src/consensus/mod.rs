//! Consensus rules: the proof-of-work puzzle and its validation

pub mod pow;

pub use pow::{ProofOfWork, DIFFICULTY};
