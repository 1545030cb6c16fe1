use crate::crypto;
use crate::error::ChainError;
use crate::miner::{meets_difficulty, CANCEL_CHECK_INTERVAL};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Content a block commits to.
///
/// `Default` is the genesis payload.
pub trait Payload: Clone + Default + fmt::Debug + Serialize {
    /// Heading used when rendering a block.
    const LABEL: &'static str;

    /// Bytes fed to the hasher. Must be deterministic.
    fn canonical_bytes(&self) -> Vec<u8>;

    /// Human-readable form.
    fn render(&self) -> String;
}

impl Payload for String {
    const LABEL: &'static str = "data";

    fn canonical_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn render(&self) -> String {
        self.clone()
    }
}

fn timestamp_nanos(timestamp: &DateTime<Utc>) -> i64 {
    timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| timestamp.timestamp_micros().saturating_mul(1000))
}

/// Everything hashed except the nonce, which always comes last.
fn hash_prefix<P: Payload>(timestamp: &DateTime<Utc>, payload: &P, previous_hash: &str) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&timestamp_nanos(timestamp).to_le_bytes());
    let payload_bytes = payload.canonical_bytes();
    for field in [payload_bytes.as_slice(), previous_hash.as_bytes()] {
        data.extend_from_slice(&(field.len() as u64).to_le_bytes());
        data.extend_from_slice(field);
    }
    data
}

fn hash_with_nonce(buf: &mut Vec<u8>, prefix_len: usize, nonce: u64) -> String {
    buf.truncate(prefix_len);
    buf.extend_from_slice(&nonce.to_le_bytes());
    crypto::digest(buf)
}

fn compute_hash<P: Payload>(
    timestamp: &DateTime<Utc>,
    payload: &P,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let mut buf = hash_prefix(timestamp, payload, previous_hash);
    let prefix_len = buf.len();
    hash_with_nonce(&mut buf, prefix_len, nonce)
}

/// A block whose payload is fixed but which has no predecessor yet.
#[derive(Debug, Clone)]
pub struct DraftBlock<P> {
    timestamp: DateTime<Utc>,
    payload: P,
    hash: String,
}

impl<P: Payload> DraftBlock<P> {
    pub fn new(timestamp: DateTime<Utc>, payload: P) -> Self {
        let hash = compute_hash(&timestamp, &payload, "", 0);
        DraftBlock {
            timestamp,
            payload,
            hash,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Always empty: a draft is not linked.
    pub fn previous_hash(&self) -> &str {
        ""
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Links the draft to its predecessor. This is the only way to obtain a [`Block`].
    pub fn link(self, previous_hash: impl Into<String>) -> Block<P> {
        let previous_hash = previous_hash.into();
        let hash = compute_hash(&self.timestamp, &self.payload, &previous_hash, 0);
        Block {
            timestamp: self.timestamp,
            payload: self.payload,
            nonce: 0,
            previous_hash,
            hash,
            difficulty: 0,
        }
    }
}

/// A linked block.
///
/// `hash` always matches `(timestamp, payload, previous_hash, nonce)`;
/// `difficulty` records the target the block was mined at and is not hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block<P> {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) payload: P,
    pub(crate) nonce: u64,
    pub(crate) previous_hash: String,
    pub(crate) hash: String,
    pub(crate) difficulty: u32,
}

impl<P: Payload> Block<P> {
    pub fn genesis(timestamp: DateTime<Utc>) -> Self {
        DraftBlock::new(timestamp, P::default()).link(GENESIS_PREVIOUS_HASH)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Recomputes the digest from the block's current fields.
    pub fn calculate_hash(&self) -> String {
        compute_hash(&self.timestamp, &self.payload, &self.previous_hash, self.nonce)
    }

    /// True when the stored hash matches a fresh recomputation.
    pub fn has_valid_hash(&self) -> bool {
        self.calculate_hash() == self.hash
    }

    /// Advances the nonce until the hash meets `difficulty` or `cancel` is
    /// raised, returning the number of nonces tried. The flag is polled every
    /// [`CANCEL_CHECK_INTERVAL`] attempts, starting before the first one.
    fn search_nonce(&mut self, difficulty: u32, cancel: Option<&AtomicBool>) -> u64 {
        let mut buf = hash_prefix(&self.timestamp, &self.payload, &self.previous_hash);
        let prefix_len = buf.len();
        let mut attempts = 0u64;
        while !meets_difficulty(&self.hash, difficulty) {
            if let Some(flag) = cancel {
                if attempts % CANCEL_CHECK_INTERVAL == 0 && flag.load(Ordering::Relaxed) {
                    break;
                }
            }
            self.nonce += 1;
            self.hash = hash_with_nonce(&mut buf, prefix_len, self.nonce);
            attempts += 1;
        }
        attempts
    }

    /// Searches nonces until the hash has `difficulty` leading `'0'`s.
    ///
    /// Returns the number of nonces tried; zero when the current hash already
    /// qualifies. Difficulties above the digest length never finish.
    pub fn mine(&mut self, difficulty: u32) -> u64 {
        let attempts = self.search_nonce(difficulty, None);
        self.difficulty = difficulty;
        attempts
    }

    /// Like [`Block::mine`], but gives up with [`ChainError::MiningCancelled`]
    /// once `cancel` is raised. The `(nonce, hash)` pair stays consistent.
    pub fn mine_cancellable(&mut self, difficulty: u32, cancel: &AtomicBool) -> Result<u64, ChainError> {
        let attempts = self.search_nonce(difficulty, Some(cancel));
        if !meets_difficulty(&self.hash, difficulty) {
            return Err(ChainError::MiningCancelled);
        }
        self.difficulty = difficulty;
        Ok(attempts)
    }
}

impl<P: Payload> fmt::Display for Block<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "timestamp: {} {}",
            self.timestamp.format("%a %b %e %H:%M:%S %Y"),
            self.timestamp.timestamp_subsec_nanos()
        )?;
        writeln!(f, "{}: {}", P::LABEL, self.payload.render())?;
        writeln!(f, "previous hash: {}", self.previous_hash)?;
        writeln!(f, "hash: {}", self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_draft_hash_is_computed_on_construction() {
        let draft = DraftBlock::new(fixed_time(), "hello".to_string());
        assert_eq!(draft.previous_hash(), "");
        assert_eq!(draft.hash().len(), 64);
        assert_eq!(draft.hash(), compute_hash(&fixed_time(), &"hello".to_string(), "", 0));
    }

    #[test]
    fn test_identical_inputs_hash_identically() {
        let a = DraftBlock::new(fixed_time(), "same".to_string()).link("abc");
        let b = DraftBlock::new(fixed_time(), "same".to_string()).link("abc");
        assert_eq!(a.hash(), b.hash());

        let c = DraftBlock::new(fixed_time(), "other".to_string()).link("abc");
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn test_field_boundaries_are_hashed() {
        let a = DraftBlock::new(fixed_time(), "ab".to_string()).link("c");
        let b = DraftBlock::new(fixed_time(), "a".to_string()).link("bc");
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_link_recomputes_hash() {
        let draft = DraftBlock::new(fixed_time(), "payload".to_string());
        let draft_hash = draft.hash().to_string();
        let block = draft.link("deadbeef");
        assert_eq!(block.previous_hash(), "deadbeef");
        assert_ne!(block.hash(), draft_hash);
        assert!(block.has_valid_hash());
        assert_eq!(block.nonce(), 0);
    }

    #[test]
    fn test_genesis_block() {
        let genesis: Block<String> = Block::genesis(fixed_time());
        assert_eq!(genesis.previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(genesis.is_genesis());
        assert!(genesis.payload().is_empty());
        assert_eq!(genesis.difficulty(), 0);
    }

    #[test]
    fn test_mine_zero_difficulty_does_not_search() {
        let mut block = DraftBlock::new(fixed_time(), "x".to_string()).link("0");
        let before = block.hash().to_string();
        assert_eq!(block.mine(0), 0);
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.hash(), before);
    }

    #[test]
    fn test_mine_meets_difficulty() {
        let mut block = DraftBlock::new(fixed_time(), "mine me".to_string()).link("prev");
        let attempts = block.mine(2);
        assert!(block.hash().starts_with("00"));
        assert_eq!(block.nonce(), attempts);
        assert_eq!(block.difficulty(), 2);
        assert!(block.has_valid_hash());
    }

    #[test]
    fn test_mine_cancellable_stops_when_flag_raised() {
        let mut block = DraftBlock::new(fixed_time(), "never".to_string()).link("prev");
        let cancel = AtomicBool::new(true);
        let result = block.mine_cancellable(crate::miner::MAX_DIFFICULTY, &cancel);
        assert_eq!(result, Err(ChainError::MiningCancelled));
        assert!(block.has_valid_hash());
        assert_eq!(block.difficulty(), 0);
    }

    #[test]
    fn test_mine_cancellable_matches_plain_mining() {
        let mut plain = DraftBlock::new(fixed_time(), "same".to_string()).link("prev");
        let mut cancellable = plain.clone();
        let cancel = AtomicBool::new(false);
        let attempts = plain.mine(2);
        assert_eq!(cancellable.mine_cancellable(2, &cancel), Ok(attempts));
        assert_eq!(plain, cancellable);
    }

    #[test]
    fn test_display_lists_fields() {
        let block = DraftBlock::new(fixed_time(), "shown".to_string()).link("prev");
        let rendered = block.to_string();
        assert!(rendered.starts_with("timestamp: Mon Jan  1 12:00:00 2024 0\n"));
        assert!(rendered.contains("data: shown\n"));
        assert!(rendered.contains("previous hash: prev\n"));
        assert!(rendered.contains(&format!("hash: {}\n", block.hash())));
    }
}
