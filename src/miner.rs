//! Proof-of-work target checks shared by block mining and chain verification.

use crate::crypto::DIGEST_HEX_LEN;

/// Largest difficulty a hex digest can satisfy.
pub const MAX_DIFFICULTY: u32 = DIGEST_HEX_LEN as u32;

/// Number of nonce attempts between two checks of a cancellation flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Returns true when `hash` starts with `difficulty` consecutive `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
