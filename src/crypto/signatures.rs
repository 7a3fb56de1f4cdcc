use crate::{ChainError, Result};
use secp256k1::ecdsa::Signature as Secp256k1Signature;

/// Compact ECDSA signature (64 bytes, r || s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; 64],
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(ChainError::Crypto("Invalid signature length".to_string()));
        }

        // Reject values secp256k1 cannot parse back
        Secp256k1Signature::from_compact(bytes)
            .map_err(|e| ChainError::Crypto(format!("Invalid signature: {}", e)))?;

        let mut array = [0u8; 64];
        array.copy_from_slice(bytes);
        Ok(Self { bytes: array })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn from_secp256k1(signature: Secp256k1Signature) -> Self {
        Self {
            bytes: signature.serialize_compact(),
        }
    }

    pub fn to_secp256k1(&self) -> Result<Secp256k1Signature> {
        Secp256k1Signature::from_compact(&self.bytes)
            .map_err(|e| ChainError::Crypto(format!("Invalid signature: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::Hash256;
    use crate::crypto::keys::PrivateKey;

    #[test]
    fn test_signature_roundtrip() -> Result<()> {
        let private_key = PrivateKey::new()?;
        let message = Hash256::hash(b"test message");
        let signature = private_key.sign(&message)?;

        let bytes = signature.to_bytes();
        let restored = Signature::from_bytes(&bytes)?;

        assert_eq!(signature, restored);

        Ok(())
    }

    #[test]
    fn test_invalid_length_rejected() {
        assert!(Signature::from_bytes(&[0u8; 63]).is_err());
        assert!(Signature::from_bytes(&[0u8; 65]).is_err());
    }
}
