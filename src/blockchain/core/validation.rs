use crate::error::ChainError;
use crate::miner::meets_difficulty;

use super::block::{Block, Payload, GENESIS_PREVIOUS_HASH};

/// Link check over adjacent pairs: `blocks[i].previous_hash == blocks[i - 1].hash`.
///
/// Stored hashes are trusted as is; nothing is recomputed.
pub fn links_are_intact<P: Payload>(blocks: &[Block<P>]) -> bool {
    blocks
        .windows(2)
        .all(|pair| pair[1].previous_hash == pair[0].hash)
}

/// Full structural check, stopping at the first failing height.
///
/// On top of the link check this recomputes every hash, requires the genesis
/// sentinel at height 0, and checks each block against the difficulty it was
/// mined at.
pub fn verify_blocks<P: Payload>(blocks: &[Block<P>]) -> Result<(), ChainError> {
    let genesis = blocks
        .first()
        .ok_or_else(|| ChainError::InvalidBlock("Chain has no genesis block".to_string()))?;
    if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(ChainError::InvalidBlock(format!(
            "Genesis block must link to {:?}, found {:?}",
            GENESIS_PREVIOUS_HASH, genesis.previous_hash
        )));
    }

    for (height, block) in blocks.iter().enumerate() {
        let expected = block.calculate_hash();
        if expected != block.hash {
            return Err(ChainError::InvalidBlock(format!(
                "Hash mismatch at height {}. Expected {}, but got {}.",
                height, expected, block.hash
            )));
        }

        if height > 0 && block.previous_hash != blocks[height - 1].hash {
            return Err(ChainError::InvalidBlockLinkage { height });
        }

        if !meets_difficulty(&block.hash, block.difficulty) {
            return Err(ChainError::InvalidProofOfWork { height });
        }
    }
    Ok(())
}
