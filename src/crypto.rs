//! Hashing primitives for hashlink

use crate::error::ChainError;
use sha2::{Digest, Sha256};

/// Raw SHA-256 output.
pub type Sha256Hash = [u8; 32];

/// Length of a rendered digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// A hash primitive that may fail to complete.
///
/// Implementations must either return the full digest of `data` or an error;
/// a partial result is never acceptable.
pub trait HashEngine {
    fn try_hash(&self, data: &[u8]) -> Result<Sha256Hash, ChainError>;
}

/// SHA-256 backed by the `sha2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Engine;

impl HashEngine for Sha256Engine {
    fn try_hash(&self, data: &[u8]) -> Result<Sha256Hash, ChainError> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Ok(hasher.finalize().into())
    }
}

/// Hashes `data` with `engine`, retrying until the engine succeeds.
///
/// There is no retry limit. With [`Sha256Engine`] the loop body runs once.
pub fn digest_with<E: HashEngine + ?Sized>(engine: &E, data: &[u8]) -> String {
    loop {
        match engine.try_hash(data) {
            Ok(hash) => return hash_to_hex(&hash),
            Err(e) => tracing::warn!("{}; retrying", e),
        }
    }
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn digest(data: &[u8]) -> String {
    digest_with(&Sha256Engine, data)
}

/// Convert a digest to a hex string for display.
pub fn hash_to_hex(hash: &Sha256Hash) -> String {
    hex::encode(hash)
}
