use crate::config::ChainConfig;
use crate::error::ChainError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

use super::block::{Block, DraftBlock, Payload};
use super::validation::{links_are_intact, verify_blocks};

const BLOCK_SEPARATOR: &str = "\n-------------------------------------------------\n";

/// An append-only sequence of linked blocks, seeded with a genesis block.
#[derive(Debug, Clone, Serialize)]
pub struct Blockchain<P> {
    pub(crate) blocks: Vec<Block<P>>,
    config: ChainConfig,
}

/// Chain of opaque string payloads, appended without mining.
pub type DataChain = Blockchain<String>;

impl<P: Payload> Blockchain<P> {
    /// Create a new `Blockchain` whose genesis block is stamped now.
    pub fn new(config: ChainConfig) -> Self {
        Self::with_genesis_timestamp(config, Utc::now())
    }

    /// Create a new `Blockchain` with a fixed genesis timestamp.
    pub fn with_genesis_timestamp(config: ChainConfig, timestamp: DateTime<Utc>) -> Self {
        let genesis = Block::genesis(timestamp);
        debug!("Created genesis block {}", genesis.hash());
        Blockchain {
            blocks: vec![genesis],
            config,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn blocks(&self) -> &[Block<P>] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block<P>> {
        self.blocks.iter()
    }

    /// Height of the tip; the genesis block is height 0.
    pub fn height(&self) -> usize {
        self.blocks.len() - 1
    }

    pub fn genesis(&self) -> &Block<P> {
        &self.blocks[0]
    }

    pub fn tip(&self) -> &Block<P> {
        &self.blocks[self.blocks.len() - 1]
    }

    fn link_to_tip(&self, timestamp: DateTime<Utc>, payload: P) -> Block<P> {
        DraftBlock::new(timestamp, payload).link(self.tip().hash())
    }

    fn push(&mut self, block: Block<P>) -> &Block<P> {
        self.blocks.push(block);
        self.tip()
    }

    /// Links `payload` to the tip and appends it without mining.
    pub fn add_block(&mut self, timestamp: DateTime<Utc>, payload: P) -> &Block<P> {
        let block = self.link_to_tip(timestamp, payload);
        debug!("Appending block {} at height {}", block.hash(), self.blocks.len());
        self.push(block)
    }

    /// Links `payload` to the tip, mines it at the configured difficulty and appends it.
    pub fn mine_block(&mut self, timestamp: DateTime<Utc>, payload: P) -> &Block<P> {
        let mut block = self.link_to_tip(timestamp, payload);
        let attempts = block.mine(self.config.difficulty);
        info!(
            "Mined block {} at height {} (nonce = {}, attempts = {})",
            block.hash(),
            self.blocks.len(),
            block.nonce(),
            attempts
        );
        self.push(block)
    }

    /// Like [`Blockchain::mine_block`], but abandons the search when `cancel`
    /// is raised. The chain is only modified once a valid nonce is found.
    pub fn mine_block_cancellable(
        &mut self,
        timestamp: DateTime<Utc>,
        payload: P,
        cancel: &AtomicBool,
    ) -> Result<&Block<P>, ChainError> {
        let mut block = self.link_to_tip(timestamp, payload);
        match block.mine_cancellable(self.config.difficulty, cancel) {
            Ok(attempts) => {
                info!(
                    "Mined block {} at height {} (nonce = {}, attempts = {})",
                    block.hash(),
                    self.blocks.len(),
                    block.nonce(),
                    attempts
                );
                Ok(self.push(block))
            }
            Err(e) => {
                warn!("Mining at height {} abandoned: {}", self.blocks.len(), e);
                Err(e)
            }
        }
    }

    /// Checks that every block links to its predecessor's stored hash.
    ///
    /// Payloads are not re-hashed and proof-of-work is not re-checked; see
    /// [`Blockchain::verify`] for that.
    pub fn is_valid(&self) -> bool {
        let valid = links_are_intact(&self.blocks);
        if !valid {
            warn!("Chain link check failed");
        }
        valid
    }

    /// Recomputes every hash and checks links and proof-of-work.
    pub fn verify(&self) -> Result<(), ChainError> {
        verify_blocks(&self.blocks)
    }

    /// Pretty-printed JSON of the configuration and every block.
    pub fn to_json(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a, P> IntoIterator for &'a Blockchain<P> {
    type Item = &'a Block<P>;
    type IntoIter = std::slice::Iter<'a, Block<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl<P: Payload> fmt::Display for Blockchain<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str(BLOCK_SEPARATOR)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
